//! Main orchestration logic.

use crate::config::ProjectConfig;
use crate::error::BundleError;
use crate::exclude::ExcludeSet;
use crate::options::Options;
use crate::output::BundleWriter;
use camino::{Utf8Path, Utf8PathBuf};
use dts_rewriter::{
    bundle_rules, parse_declaration, resolve_module_id, rewrite, to_module_id, DeclaredModules,
    ExportShape, ModuleIdContext, ModuleResolver, ParsedDeclaration, RewriteError,
};
use tokio::io::AsyncWrite;
use tsc_runner::{
    absolutize, normalize, CompilationUnit, DeclarationEmitter, EmitRequest, ModuleResolution,
    NewLine, ScriptTarget, TscDiagnostic, TscRunner, UnitKind,
};

/// Settings derived from [`Options`] and the project configuration.
#[derive(Debug)]
struct Plan {
    project: Option<Utf8PathBuf>,
    base_dir: Utf8PathBuf,
    files: Vec<Utf8PathBuf>,
    target: ScriptTarget,
    module_resolution: Option<ModuleResolution>,
    jsx: Option<String>,
    out_dir: Option<Utf8PathBuf>,
    excludes: ExcludeSet,
    out: Utf8PathBuf,
}

/// Bundles the declarations of a project into one file.
///
/// Locates the TypeScript compiler from the base directory. Partial output
/// may remain at `options.out` when an error is returned.
pub async fn generate(options: Options) -> Result<(), BundleError> {
    let plan = Plan::resolve(&options)?;
    let runner = TscRunner::resolve(&plan.base_dir)?;
    tracing::debug!("using compiler at {}", runner.tsc_path());
    execute(&runner, &options, plan).await
}

/// Like [`generate`], with a caller-provided emit step.
pub async fn generate_with<E: DeclarationEmitter>(
    emitter: &E,
    options: Options,
) -> Result<(), BundleError> {
    let plan = Plan::resolve(&options)?;
    execute(emitter, &options, plan).await
}

impl Plan {
    fn resolve(options: &Options) -> Result<Self, BundleError> {
        if options.out.as_str().is_empty() {
            return Err(BundleError::Configuration(
                "an output path is required".to_string(),
            ));
        }
        if options.main.is_some() && options.name.as_deref().map_or(true, str::is_empty) {
            return Err(BundleError::Configuration(
                "a name is required to alias the main module".to_string(),
            ));
        }

        let cwd = current_dir()?;
        let base_option = options.base_dir.as_deref().map(|dir| absolutize(dir, &cwd));

        let config = if options.project.is_some() || options.files.is_empty() {
            let location = match (&options.project, &base_option) {
                (Some(project), _) => absolutize(project, &cwd),
                (None, Some(base)) => base.join("tsconfig.json"),
                (None, None) => {
                    return Err(BundleError::Configuration(
                        "either input files with a base directory or a project configuration is required"
                            .to_string(),
                    ))
                }
            };
            let path = ProjectConfig::find(&location).ok_or_else(|| {
                BundleError::Configuration(format!("no project configuration found at {}", location))
            })?;
            Some(ProjectConfig::load(&path)?)
        } else {
            None
        };

        let base_dir = match &config {
            Some(config) => config.root_dir.clone().unwrap_or_else(|| config.dir()),
            None => base_option.unwrap_or_else(|| cwd.clone()),
        };
        let base_dir = normalize(&base_dir);

        let files: Vec<Utf8PathBuf> = match &config {
            Some(config) => config.files.clone(),
            None => options
                .files
                .iter()
                .map(|file| absolutize(file, &base_dir))
                .collect(),
        };
        if files.is_empty() {
            return Err(BundleError::Configuration("no input files".to_string()));
        }

        let target = config
            .as_ref()
            .and_then(|config| config.target)
            .or(options.target)
            .unwrap_or_default();
        let module_resolution = config
            .as_ref()
            .and_then(|config| config.module_resolution)
            .or(options.module_resolution);

        let excludes = ExcludeSet::new(&base_dir, &options.exclude)?;

        Ok(Self {
            project: config.as_ref().map(|config| config.path.clone()),
            out_dir: config.as_ref().and_then(|config| config.out_dir.clone()),
            jsx: config.and_then(|config| config.jsx),
            base_dir,
            files,
            target,
            module_resolution,
            excludes,
            out: absolutize(&options.out, &cwd),
        })
    }

    fn report(&self, options: &Options) {
        if let Some(project) = &self.project {
            options.verbose_message(&format!("project = \"{}\"", project));
        }
        options.verbose_message(&format!("baseDir = \"{}\"", self.base_dir));
        options.verbose_message(&format!("target = {}", self.target));
        if let Some(out_dir) = &self.out_dir {
            options.verbose_message(&format!("outDir = \"{}\"", out_dir));
        }
        if let Some(mode) = self.module_resolution {
            options.verbose_message(&format!("moduleResolution = {}", mode));
        }
        options.verbose_message("filenames:");
        for file in &self.files {
            options.verbose_message(&format!("  {}", file));
        }
        options.verbose_message("excludes:");
        for pattern in self.excludes.patterns() {
            options.verbose_message(&format!("  {}", pattern));
        }
    }

    fn emit_request(&self, options: &Options) -> EmitRequest {
        EmitRequest {
            root_dir: self.base_dir.clone(),
            project: self.project.clone(),
            files: self.files.clone(),
            target: Some(self.target),
            module_resolution: self.module_resolution,
            jsx: self.jsx.clone(),
            types: options.types.clone(),
            new_line: NewLine::from_eol(options.eol()),
        }
    }

    /// Whether a program file belongs in the bundle.
    fn accepts(&self, unit: &CompilationUnit) -> bool {
        unit.source_path.starts_with(&self.base_dir) && !self.excludes.is_excluded(&unit.source_path)
    }
}

async fn execute<E: DeclarationEmitter>(
    emitter: &E,
    options: &Options,
    plan: Plan,
) -> Result<(), BundleError> {
    plan.report(options);

    let mut writer = BundleWriter::create(&plan.out, options.eol(), options.indent()).await?;
    write_references(&mut writer, options).await?;

    let compilation = emitter.emit(&plan.emit_request(options)).await?;

    if !compilation.global_diagnostics.is_empty() {
        return Err(emitter_error(None, &compilation.global_diagnostics));
    }

    // Every program file is parsed before any rewrite, including files left
    // out of the bundle, so ambient module names from anywhere are known.
    let parsed: Vec<Option<Result<ParsedDeclaration, RewriteError>>> = compilation
        .units
        .iter()
        .map(|unit| {
            if unit.kind == UnitKind::NotEmitted {
                return None;
            }
            let result = parse_declaration(&unit.declaration_path, unit.text.as_str());
            if let (UnitKind::Declaration, Err(err)) = (unit.kind, &result) {
                tracing::debug!("ambient modules of {} unavailable: {}", unit.source_path, err);
            }
            Some(result)
        })
        .collect();
    let declared = DeclaredModules::collect(parsed.iter().filter_map(|p| p.as_ref()?.as_ref().ok()));
    tracing::debug!("{} ambient module declarations", declared.len());

    let units = compilation.units.iter().zip(parsed).filter(|(unit, _)| {
        let accepted = plan.accepts(unit);
        if !accepted {
            tracing::debug!("skipping {}", unit.source_path);
        }
        accepted
    });

    let resolver = ModuleResolver::new(&declared)
        .with_prefix(options.prefix.as_deref())
        .with_hook(options.resolve_module_import.as_ref());

    let mut main_shape: Option<ExportShape> = None;
    for (unit, parsed) in units {
        options.send_message(&format!("Processing {}", unit.source_path));

        if !unit.diagnostics.is_empty() {
            return Err(emitter_error(Some(&unit.source_path), &unit.diagnostics));
        }

        match unit.kind {
            UnitKind::NotEmitted => {
                tracing::debug!("no declaration for {}", unit.source_path);
            }
            UnitKind::Declaration => {
                writer.write_raw(&unit.text).await?;
            }
            UnitKind::Emitted => {
                let parsed = match parsed {
                    Some(Ok(parsed)) => parsed,
                    Some(Err(err)) => return Err(BundleError::Emitter(err.to_string())),
                    None => continue,
                };
                if let Some(shape) = write_emitted(&mut writer, options, &plan, &resolver, &parsed).await? {
                    main_shape = Some(main_shape.unwrap_or_default().merge(shape));
                }
            }
        }
    }

    if let (Some(main), Some(name)) = (&options.main, &options.name) {
        let shape = main_shape.unwrap_or_else(|| {
            tracing::warn!("main module {} was not among the processed files", main);
            ExportShape::default()
        });
        writer.write_main_alias(name, main, shape, plan.target).await?;
        options.send_message(&format!("Aliased main module {} to {}", name, main));
    }

    writer.finish().await?;
    tracing::info!("wrote {}", plan.out);
    Ok(())
}

async fn write_references<W: AsyncWrite + Unpin>(
    writer: &mut BundleWriter<W>,
    options: &Options,
) -> Result<(), BundleError> {
    for path in &options.externs {
        options.send_message(&format!("Writing external dependency {}", path));
        writer.write_reference_path(path).await?;
    }
    for name in &options.types {
        options.send_message(&format!("Writing type dependency {}", name));
        writer.write_reference_types(name).await?;
    }
    Ok(())
}

/// Writes one emitted declaration. Returns its export shape when it is the
/// main module.
async fn write_emitted<W: AsyncWrite + Unpin>(
    writer: &mut BundleWriter<W>,
    options: &Options,
    plan: &Plan,
    resolver: &ModuleResolver<'_>,
    parsed: &ParsedDeclaration,
) -> Result<Option<ExportShape>, BundleError> {
    if !parsed.is_external_module() {
        writer.write_raw(parsed.source()).await?;
        return Ok(None);
    }

    let declaration_path = parsed.path();
    let current_module_id = to_module_id(declaration_path, &plan.base_dir, options.name.as_deref());
    let relative_module_path = to_module_id(declaration_path, &plan.base_dir, None);
    let context = ModuleIdContext {
        declaration_path,
        relative_module_path: &relative_module_path,
        current_module_id: &current_module_id,
    };
    let module_id = resolve_module_id(
        &context,
        options.resolve_module_id.as_ref(),
        options.prefix.as_deref(),
    );

    let content = rewrite(parsed, bundle_rules(resolver, &current_module_id));
    writer.write_module(&module_id, &content).await?;

    let is_main = options
        .main
        .as_deref()
        .is_some_and(|main| main == module_id || main == current_module_id);
    Ok(is_main.then(|| ExportShape::of(parsed)))
}

fn emitter_error(file: Option<&Utf8Path>, diagnostics: &[TscDiagnostic]) -> BundleError {
    let mut message = match file {
        Some(file) => format!("Declaration generation failed for {}", file),
        None => "Declaration generation failed".to_string(),
    };
    for diag in diagnostics {
        message.push('\n');
        message.push_str(&diag.to_string());
    }
    BundleError::Emitter(message)
}

fn current_dir() -> Result<Utf8PathBuf, BundleError> {
    let cwd = std::env::current_dir().map_err(|err| {
        BundleError::Configuration(format!("cannot read the current directory: {}", err))
    })?;
    Utf8PathBuf::try_from(cwd).map_err(|err| {
        BundleError::Configuration(format!(
            "current directory is not valid UTF-8: {}",
            err.into_path_buf().display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_output() {
        let options = Options {
            base_dir: Some(Utf8PathBuf::from("/project")),
            files: vec![Utf8PathBuf::from("index.ts")],
            ..Default::default()
        };
        let err = Plan::resolve(&options).unwrap_err();
        assert!(matches!(err, BundleError::Configuration(_)));
    }

    #[test]
    fn test_main_requires_name() {
        let options = Options {
            base_dir: Some(Utf8PathBuf::from("/project")),
            files: vec![Utf8PathBuf::from("index.ts")],
            out: Utf8PathBuf::from("/project/out.d.ts"),
            main: Some("foo/index".to_string()),
            ..Default::default()
        };
        let err = Plan::resolve(&options).unwrap_err();
        assert!(err.to_string().contains("name"));
    }

    #[test]
    fn test_explicit_files_resolve_against_base() {
        let options = Options {
            base_dir: Some(Utf8PathBuf::from("/project/src")),
            files: vec![Utf8PathBuf::from("index.ts"), Utf8PathBuf::from("./sub/../Bar.ts")],
            out: Utf8PathBuf::from("/project/out.d.ts"),
            target: Some(ScriptTarget::Es5),
            ..Default::default()
        };
        let plan = Plan::resolve(&options).unwrap();
        assert_eq!(plan.base_dir, Utf8PathBuf::from("/project/src"));
        assert_eq!(
            plan.files,
            vec![
                Utf8PathBuf::from("/project/src/index.ts"),
                Utf8PathBuf::from("/project/src/Bar.ts"),
            ]
        );
        assert_eq!(plan.target, ScriptTarget::Es5);
        assert!(plan.project.is_none());
    }

    #[test]
    fn test_missing_project_is_configuration_error() {
        let options = Options {
            project: Some(Utf8PathBuf::from("/nonexistent/project/tsconfig.json")),
            out: Utf8PathBuf::from("/tmp/out.d.ts"),
            ..Default::default()
        };
        let err = Plan::resolve(&options).unwrap_err();
        assert!(matches!(err, BundleError::Configuration(_)));
    }
}

//! `scenic options` command handler

use std::io::Write;
use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;
use tracing::info;

use scenic_core::config::{
    self, DEFAULT_OPTIONS_FILE, EffectiveOptions, PartialOptions, SystemProperties,
};
use scenic_runner::orchestrator::DEFAULT_CALLER_NAMESPACE;

use crate::cli::{OptionOverrides, OptionsAction, OptionsArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Where the option layers come from for one invocation.
#[derive(Debug, Clone, Default)]
pub struct OptionSources {
    /// Explicit options file; `None` means `scenic.toml` if present.
    pub options_file: Option<PathBuf>,
    /// `key=value` system property definitions.
    pub defines: Vec<String>,
    /// Environment snapshot; `None` skips the environment layer.
    pub environment: Option<Vec<(String, String)>>,
    pub overrides: OptionOverrides,
}

impl OptionSources {
    /// Display label for the options file layer.
    pub fn source_label(&self) -> String {
        match &self.options_file {
            Some(path) => path.display().to_string(),
            None => DEFAULT_OPTIONS_FILE.to_owned(),
        }
    }

    /// Load every layer in precedence order (lowest first).
    ///
    /// An explicit options file must exist; the default one may be absent.
    pub async fn layers(&self) -> Result<[Option<PartialOptions>; 4], CliError> {
        let file = match &self.options_file {
            Some(path) => Some(PartialOptions::from_file(path).await?),
            None => PartialOptions::load_file(DEFAULT_OPTIONS_FILE).await?,
        };
        let environment = self.environment.as_ref().map(|vars| {
            PartialOptions::from_env_vars(vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        });

        let mut system = SystemProperties::new();
        for definition in &self.defines {
            system
                .define(definition)
                .map_err(|e| CliError::Config(e.to_string()))?;
        }

        Ok([
            file,
            environment,
            Some(system.to_partial()),
            Some(overrides_layer(&self.overrides)),
        ])
    }

    /// Resolve and validate the effective options.
    pub async fn resolve(&self) -> Result<EffectiveOptions, CliError> {
        let layers = self.layers().await?;
        Ok(config::resolve(layers, DEFAULT_CALLER_NAMESPACE)?)
    }
}

/// Command-line overrides as the highest-precedence layer. Unset flags stay unset.
pub fn overrides_layer(overrides: &OptionOverrides) -> PartialOptions {
    fn list(values: &[String]) -> Option<Vec<String>> {
        (!values.is_empty()).then(|| values.to_vec())
    }

    PartialOptions {
        features: list(&overrides.features),
        glue: list(&overrides.glue),
        tags: list(&overrides.tags),
        name: list(&overrides.name),
        plugin: list(&overrides.plugin),
        threads: overrides.threads,
        limit: overrides.limit,
        dry_run: overrides.dry_run.then_some(true),
        monochrome: overrides.monochrome.then_some(true),
        wip: overrides.wip.then_some(true),
        ..PartialOptions::default()
    }
}

/// Execute the `options` command.
pub async fn execute(
    args: OptionsArgs,
    mut sources: OptionSources,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    sources.overrides = args.overrides;
    match args.action {
        OptionsAction::Show => execute_show(&sources, writer).await,
        OptionsAction::Validate => execute_validate(&sources, writer).await,
        OptionsAction::Export => execute_export(&sources, writer).await,
    }
}

async fn execute_show(sources: &OptionSources, writer: &OutputWriter) -> Result<(), CliError> {
    info!(source = %sources.source_label(), "resolving options");
    let options = sources.resolve().await?;
    apply_color_setting(&options);

    let report = OptionsReport {
        source: sources.source_label(),
        options_toml: toml::to_string_pretty(&options)
            .unwrap_or_else(|e| format!("(serialization error: {})", e)),
        options,
    };
    writer.render(&report)
}

/// Resolve the options, reporting every problem instead of failing fast.
async fn execute_validate(sources: &OptionSources, writer: &OutputWriter) -> Result<(), CliError> {
    info!(source = %sources.source_label(), "validating options");
    let report = validate(sources).await;
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("options are invalid".to_owned()));
    }
    Ok(())
}

async fn execute_export(sources: &OptionSources, writer: &OutputWriter) -> Result<(), CliError> {
    let options = sources.resolve().await?;
    writer.render(&export(&options))
}

/// Build the validation report for the given sources.
pub async fn validate(sources: &OptionSources) -> ValidationReport {
    let errors = match sources.resolve().await {
        Ok(_) => Vec::new(),
        Err(e) => vec![e.to_string()],
    };
    ValidationReport {
        source: sources.source_label(),
        valid: errors.is_empty(),
        errors,
    }
}

/// Effective options as `cucumber.*` property lines.
pub fn export(options: &EffectiveOptions) -> ExportReport {
    ExportReport {
        properties: options
            .to_properties()
            .into_iter()
            .map(|(key, value)| Property {
                key: key.to_owned(),
                value,
            })
            .collect(),
    }
}

fn apply_color_setting(options: &EffectiveOptions) {
    if options.monochrome {
        colored::control::set_override(false);
    }
}

/// Effective options display report.
///
/// `options_toml` is only used for text rendering.
#[derive(Serialize)]
pub struct OptionsReport {
    /// Options file the file layer was read from
    pub source: String,
    pub options: EffectiveOptions,
    #[serde(skip)]
    pub options_toml: String,
}

impl Render for OptionsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Effective options (source: {})", self.source.bold())?;
        writeln!(w)?;
        write!(w, "{}", self.options_toml)?;
        Ok(())
    }
}

/// Options validation report.
#[derive(Serialize)]
pub struct ValidationReport {
    pub source: String,
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Options Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct Property {
    pub key: String,
    pub value: String,
}

/// Property lines handed to a child runner.
#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub properties: Vec<Property>,
}

impl ExportReport {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

impl Render for ExportReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        for property in &self.properties {
            writeln!(w, "{}={}", property.key, property.value)?;
        }
        Ok(())
    }
}

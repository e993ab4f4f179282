use async_trait::async_trait;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use sd_builder_config::{BuildOptions, DependencyManifest};

use super::write_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Concatenates the manifest's stylesheets into `_assets/css/vendor.css`.
#[derive(Debug, Default)]
pub struct VendorStylesStep;

#[async_trait]
impl BuildStep for VendorStylesStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::VendorStyles,
            inputs: &["deps.json"],
            output: "build/_assets/css/vendor.css",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let manifest = DependencyManifest::read(&options.manifest_path())?;

        let mut sources = Vec::with_capacity(manifest.styles.len());
        for style in &manifest.styles {
            let path = options.resolve_from_root(style);
            let css = tokio::fs::read_to_string(&path)
                .await
                .map_err(StepError::io(&path))?;
            sources.push(css);
        }
        let css = sources.join("\n");

        let css = if options.minify_files() && !css.is_empty() {
            minify_css(&css)?
        } else {
            css
        };

        let out = write_artifact(
            &options.build_dir().join("_assets/css/vendor.css"),
            css,
        )
        .await?;
        Ok(StepOutcome::written(vec![out]))
    }
}

fn minify_css(source: &str) -> Result<String, StepError> {
    let mut stylesheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: "vendor.css".to_string(),
            ..Default::default()
        },
    )
    .map_err(|e| StepError::Css(format!("Failed to parse vendor CSS: {}", e)))?;

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| StepError::Css(format!("Failed to minify vendor CSS: {}", e)))?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..Default::default()
        })
        .map_err(|e| StepError::Css(format!("Failed to print vendor CSS: {}", e)))?;

    Ok(result.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn project(manifest: Option<&str>, vars: &[(&str, &str)]) -> (TempDir, BuildOptions) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.css"), ".a {\n  color: red;\n}\n").unwrap();
        std::fs::write(temp.path().join("b.css"), ".b {\n  margin: 0;\n}\n").unwrap();
        if let Some(manifest) = manifest {
            std::fs::write(temp.path().join("deps.json"), manifest).unwrap();
        }
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let options = BuildOptions::resolve(&vars, temp.path());
        (temp, options)
    }

    fn vendor_css(options: &BuildOptions) -> String {
        std::fs::read_to_string(options.build_dir().join("_assets/css/vendor.css")).unwrap()
    }

    #[tokio::test]
    async fn test_development_concatenates_in_order() {
        let (_temp, options) = project(Some(r#"{"css": ["a.css", "b.css"]}"#), &[]);
        VendorStylesStep.run(&options).await.unwrap();

        assert_eq!(
            vendor_css(&options),
            ".a {\n  color: red;\n}\n\n.b {\n  margin: 0;\n}\n"
        );
    }

    #[tokio::test]
    async fn test_production_minifies_in_order() {
        let (_temp, options) = project(
            Some(r#"{"css": ["a.css", "b.css"]}"#),
            &[("NODE_ENV", "production")],
        );
        VendorStylesStep.run(&options).await.unwrap();

        let css = vendor_css(&options);
        assert!(!css.contains('\n'));
        let a = css.find(".a{").unwrap();
        let b = css.find(".b{").unwrap();
        assert!(a < b);
        assert!(css.contains("color:red"));
        assert!(css.contains("margin:0"));
    }

    #[tokio::test]
    async fn test_missing_manifest_writes_empty_file() {
        let (_temp, options) = project(None, &[("NODE_ENV", "production")]);
        VendorStylesStep.run(&options).await.unwrap();
        assert_eq!(vendor_css(&options), "");
    }

    #[tokio::test]
    async fn test_malformed_manifest_fails() {
        let (_temp, options) = project(Some("{"), &[]);
        let err = VendorStylesStep.run(&options).await.unwrap_err();
        assert!(matches!(err, StepError::Manifest(_)));
    }

    #[tokio::test]
    async fn test_missing_listed_file_fails() {
        let (_temp, options) = project(Some(r#"{"css": ["missing.css"]}"#), &[]);
        let err = VendorStylesStep.run(&options).await.unwrap_err();
        assert!(matches!(err, StepError::Io { .. }));
    }
}

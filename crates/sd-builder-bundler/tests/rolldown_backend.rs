//! Bundling a small project through the real Rolldown backend.

use std::collections::HashMap;
use std::sync::Arc;

use sd_builder_bundler::{BundlerSessionManager, RolldownBackend};
use sd_builder_config::BuildOptions;
use tempfile::TempDir;

const MAIN_JSX: &str = r#"// Greets the user on startup.
function greet() {
    const longDescriptiveGreeting = "hello from " + process.env.NODE_ENV;
    console.log(longDescriptiveGreeting);
}

greet();
"#;

fn project(node_env: &str) -> (TempDir, BuildOptions) {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("app")).unwrap();
    std::fs::write(temp.path().join("app/main.jsx"), MAIN_JSX).unwrap();

    let mut vars = HashMap::new();
    vars.insert("NODE_ENV".to_string(), node_env.to_string());
    let options = BuildOptions::resolve(&vars, temp.path());
    (temp, options)
}

fn manager() -> BundlerSessionManager {
    BundlerSessionManager::new(Arc::new(RolldownBackend::new()))
}

fn read_app(options: &BuildOptions) -> String {
    std::fs::read_to_string(options.build_dir().join("_assets/js/app.js")).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_writes_bundle_and_source_map() {
    let (_temp, options) = project("development");
    let mut manager = manager();

    let result = manager.run(&options).await.unwrap();

    let js_dir = options.build_dir().join("_assets/js");
    assert!(js_dir.join("app.js").is_file());
    assert!(js_dir.join("app.js.map").is_file());
    assert!(result.files.contains(&js_dir.join("app.js")));

    let code = read_app(&options);
    assert!(code.contains("longDescriptiveGreeting"));
    assert!(code.contains("development"));
    assert!(!code.contains("process.env.NODE_ENV"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_run_reuses_session() {
    let (_temp, options) = project("development");
    let mut manager = manager();

    let first = manager.run(&options).await.unwrap();
    std::fs::remove_file(options.build_dir().join("_assets/js/app.js")).unwrap();
    let second = manager.run(&options).await.unwrap();

    assert!(!first.reused);
    assert!(second.reused);
    assert_eq!(second.token, first.token);
    assert_eq!(manager.session_token(), Some(first.token));
    assert!(read_app(&options).contains("longDescriptiveGreeting"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_production_output_is_minified() {
    let (_dev_temp, dev_options) = project("development");
    let (_prod_temp, prod_options) = project("production");

    manager().run(&dev_options).await.unwrap();
    manager().run(&prod_options).await.unwrap();

    let dev = read_app(&dev_options);
    let prod = read_app(&prod_options);
    assert!(prod.len() < dev.len());
    assert!(!prod.contains("longDescriptiveGreeting"));
    assert!(!prod.contains("Greets the user"));
    assert!(prod.contains("production"));
}

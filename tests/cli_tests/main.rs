use std::process::Command;

fn embed() -> Command {
    Command::new(env!("CARGO_BIN_EXE_embed"))
}

#[test]
fn missing_argument_prints_usage_and_exits_1() {
    let output = embed().output().expect("failed to run embed");

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr was: {stderr}");
}

#[test]
fn invalid_model_is_a_clap_error() {
    let output = embed()
        .args(["--model", "gpt-2", "hello"])
        .output()
        .expect("failed to run embed");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
}

#[test]
fn text_starting_with_hyphen_is_not_an_option() {
    // `--help` after the text stops before any model is loaded.
    let output = embed()
        .args(["-x", "--help"])
        .output()
        .expect("failed to run embed");

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "stdout was: {stdout}");
}

#[test]
#[ignore = "downloads model weights from the Hugging Face Hub"]
fn hello_world_prints_384_numbers() {
    let output = embed()
        .args(["--cpu", "hello world"])
        .output()
        .expect("failed to run embed");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 1);
    let embedding: Vec<f64> = serde_json::from_str(stdout.trim_end()).unwrap();
    assert_eq!(embedding.len(), 384);
}

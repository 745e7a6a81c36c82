//! Terminal prompt answers.

use kvm_updater::update::prompt::ask;
use kvm_updater::update::{PromptRequest, PromptResponse};
use std::io::Cursor;

fn request() -> PromptRequest {
    PromptRequest {
        current_version: "v1.0.0".to_string(),
        latest_version: "v1.1.0".to_string(),
    }
}

fn answer(input: &str) -> (PromptResponse, String) {
    let mut input = Cursor::new(input.as_bytes().to_vec());
    let mut output = Vec::new();
    let response = ask(&mut input, &mut output, &request()).unwrap();
    (response, String::from_utf8(output).unwrap())
}

#[test]
fn test_enter_accepts_without_remembering() {
    let (response, output) = answer("\n\n");
    assert_eq!(response, PromptResponse::accept());
    assert!(output.contains("Would you like to install it now?"));
    assert!(output.contains("Remember my selection?"));
}

#[test]
fn test_decline_and_remember() {
    let (response, _) = answer("no\nyes\n");
    assert_eq!(response, PromptResponse::decline().remembered());
}

#[test]
fn test_end_of_input_declines() {
    let (response, output) = answer("");
    assert_eq!(response, PromptResponse::decline());
    assert!(!output.contains("Remember my selection?"));
}

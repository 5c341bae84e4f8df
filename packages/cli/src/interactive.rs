//! Interactive mode.
//!
//! Prompts for the page origin, then for one click at a time, waiting for
//! each translation before asking for the next.

use std::path::PathBuf;

use dialoguer::Input;
use tkv_client::config::ClientConfig;
use tkv_client::controller::Outcome;

use crate::scene::{parse_click, write_scene};

/// Runs an interactive session.
///
/// # Errors
///
/// Returns an error if a prompt fails, the origin is unusable, or the
/// scene cannot be written.
pub async fn run(mut config: ClientConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Territory Translation Client");
    println!();

    config.page_origin = Input::new()
        .with_prompt("Page URL")
        .default(config.page_origin.clone())
        .interact_text()?;

    let mut controller = tkv_client::headless_controller(&config)?;

    loop {
        let line: String = Input::new()
            .with_prompt("Click (lat,lng), empty to finish")
            .allow_empty(true)
            .interact_text()?;

        if line.trim().is_empty() {
            break;
        }

        let point = match parse_click(&line) {
            Ok(point) => point,
            Err(e) => {
                println!("  {e}");
                continue;
            }
        };

        controller.on_click(point);
        while let Some(completion) = controller.next_completion().await {
            match controller.on_completion(completion) {
                Outcome::Rendered { token, summary } => println!(
                    "  {token}: {} ({} border points)",
                    summary.label, summary.border_markers
                ),
                Outcome::Stale { token, .. } => println!("  {token}: superseded"),
                Outcome::Failed { token, message } => println!("  {token}: {message}"),
            }
        }
    }

    let out: String = Input::new()
        .with_prompt("Write scene to (empty for stdout)")
        .allow_empty(true)
        .interact_text()?;
    let out = (!out.trim().is_empty()).then(|| PathBuf::from(out.trim()));

    write_scene(controller.source(), controller.target(), out.as_deref())
}

//! Command-line driver for the session engine.
//!
//! Replays a script of button presses against one session and writes the
//! final committed image, e.g.
//!
//! ```text
//! photo-session in.jpg out.jpg brightness:+3 contrast:-2 pixelate:+5 undo
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use photo_session::{Direction, Editor, EditorConfig, Effect, SessionId};

#[derive(Parser, Debug)]
#[command(name = "photo-session")]
#[command(about = "Apply staged, undoable edits to a JPEG")]
struct Cli {
    /// JPEG to upload
    input: PathBuf,

    /// Where to write the final committed image
    output: PathBuf,

    /// Steps to replay in order
    ///
    /// `brightness:+N`, `contrast:-N`, `pixelate:+N` open the effect, press
    /// "+" or "-" N times, then preview and save. `undo` and `redo` step
    /// through history.
    steps: Vec<Step>,
}

/// One scripted user action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Apply {
        effect: Effect,
        direction: Direction,
        presses: u32,
    },
    Undo,
    Redo,
}

impl FromStr for Step {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "undo" => return Ok(Step::Undo),
            "redo" => return Ok(Step::Redo),
            _ => {}
        }

        let Some((name, amount)) = s.split_once(':') else {
            bail!("unrecognised step '{}' (expected effect:+N, effect:-N, undo or redo)", s);
        };

        let effect = match name {
            "brightness" => Effect::Brightness,
            "contrast" => Effect::Contrast,
            "pixelate" => Effect::Pixelate,
            other => bail!("unknown effect '{}'", other),
        };

        let (direction, count) = if let Some(n) = amount.strip_prefix('+') {
            (Direction::Increase, n)
        } else if let Some(n) = amount.strip_prefix('-') {
            (Direction::Decrease, n)
        } else {
            bail!("step '{}' needs a + or - before the press count", s);
        };

        let presses = count
            .parse()
            .with_context(|| format!("invalid press count in '{}'", s))?;

        Ok(Step::Apply {
            effect,
            direction,
            presses,
        })
    }
}

async fn run_step(editor: &Editor, id: SessionId, step: Step) -> Result<()> {
    match step {
        Step::Apply {
            effect,
            direction,
            presses,
        } => {
            editor.open_effect(id, effect).await;
            let mut view = None;
            for _ in 0..presses {
                view = Some(editor.adjust_parameter(id, effect, direction).await?);
            }
            if let Some(view) = view {
                info!("{}", view);
            }
            // First press renders the preview, second saves it
            editor.request_preview_or_commit(id, effect).await?;
            let saved = editor.request_preview_or_commit(id, effect).await?;
            info!(stage = ?saved.stage, "{} saved", effect);
        }
        Step::Undo => {
            let outcome = editor.undo(id).await;
            info!(applied = outcome.applied, can_undo = outcome.can_undo, "undo");
        }
        Step::Redo => {
            let outcome = editor.redo(id).await;
            info!(applied = outcome.applied, can_redo = outcome.can_redo, "redo");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Cli {
        input,
        output,
        steps,
    } = Cli::parse();

    let config = EditorConfig::load().context("failed to load configuration")?;
    let editor = Editor::new(config);
    let id = SessionId(0);

    let bytes = tokio::fs::read(&input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    editor.upload_image(id, bytes).await?;

    for step in steps {
        run_step(&editor, id, step).await?;
    }

    let Some(image) = editor.current_image(id).await else {
        bail!("session has no image");
    };
    tokio::fs::write(&output, image.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!(bytes = image.len(), "wrote {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_steps() {
        assert_eq!(
            "brightness:+3".parse::<Step>().unwrap(),
            Step::Apply {
                effect: Effect::Brightness,
                direction: Direction::Increase,
                presses: 3,
            }
        );
        assert_eq!(
            "pixelate:-1".parse::<Step>().unwrap(),
            Step::Apply {
                effect: Effect::Pixelate,
                direction: Direction::Decrease,
                presses: 1,
            }
        );
        assert_eq!("undo".parse::<Step>().unwrap(), Step::Undo);
        assert_eq!("redo".parse::<Step>().unwrap(), Step::Redo);
    }

    #[test]
    fn test_cli_parses_positionals_and_steps() {
        let cli = Cli::try_parse_from(["photo-session", "in.jpg", "out.jpg", "contrast:-2", "undo"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("in.jpg"));
        assert_eq!(cli.output, PathBuf::from("out.jpg"));
        assert_eq!(
            cli.steps,
            vec![
                Step::Apply {
                    effect: Effect::Contrast,
                    direction: Direction::Decrease,
                    presses: 2,
                },
                Step::Undo,
            ]
        );

        let cli = Cli::try_parse_from(["photo-session", "in.jpg", "out.jpg"]).unwrap();
        assert!(cli.steps.is_empty());
    }

    #[test]
    fn test_cli_rejects_bad_invocations() {
        assert!(Cli::try_parse_from(["photo-session", "in.jpg"]).is_err());
        assert!(Cli::try_parse_from(["photo-session", "in.jpg", "out.jpg", "blur:+1"]).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["blur:+1", "contrast:3", "contrast:+x", "brightness", ""] {
            assert!(bad.parse::<Step>().is_err(), "accepted {:?}", bad);
        }
    }
}

use crate::metadata::FileMetadata;
use crate::rule::{Action, ArchiveFormat, ConflictResolution};
use crate::settings::EngineSettings;
use crate::tokens::{self, TokenContext};

/// Renders an action list as human-readable descriptions with tokens
/// resolved against the file. Performs no I/O; the preview service calls
/// this for every sampled file.
///
/// Token resolution uses the deterministic context so an unchanged preview
/// re-renders to identical text.
pub fn describe_actions(
    actions: &[Action],
    meta: &FileMetadata,
    sequence: u64,
    settings: &EngineSettings,
) -> Vec<String> {
    let ctx = TokenContext::deterministic(meta, sequence);
    actions
        .iter()
        .map(|action| describe_action(action, &ctx, settings))
        .collect()
}

fn describe_action(action: &Action, ctx: &TokenContext, settings: &EngineSettings) -> String {
    match action {
        Action::Move {
            destination,
            on_conflict,
            ..
        } => format!(
            "Move to {}{}",
            tokens::resolve(destination, ctx),
            conflict_note(*on_conflict)
        ),
        Action::Copy {
            destination,
            on_conflict,
            ..
        } => format!(
            "Copy to {}{}",
            tokens::resolve(destination, ctx),
            conflict_note(*on_conflict)
        ),
        Action::SortIntoSubfolder {
            destination,
            on_conflict,
            ..
        } => format!(
            "Sort into subfolder {}{}",
            tokens::resolve(destination, ctx),
            conflict_note(*on_conflict)
        ),
        Action::Rename {
            pattern,
            on_conflict,
        } => format!(
            "Rename to {}{}",
            tokens::resolve(pattern, ctx),
            conflict_note(*on_conflict)
        ),
        Action::Archive {
            destination,
            format,
            delete_original,
        } => {
            let fmt = match format {
                ArchiveFormat::Zip => "zip",
                ArchiveFormat::Tar => "tar",
                ArchiveFormat::TarGz => "tar.gz",
            };
            let mut text = format!(
                "Archive ({}) to {}",
                fmt,
                tokens::resolve(destination, ctx)
            );
            if *delete_original {
                text.push_str(", then trash the original");
            }
            text
        }
        Action::Unarchive {
            destination,
            delete_archive,
        } => {
            let mut text = match destination {
                Some(pattern) => format!("Extract to {}", tokens::resolve(pattern, ctx)),
                None => "Extract into the current folder".to_string(),
            };
            if *delete_archive {
                text.push_str(", then trash the archive");
            }
            text
        }
        Action::Delete => "Move to trash".to_string(),
        Action::DeletePermanently => {
            if settings.allow_permanent_delete {
                "Delete permanently".to_string()
            } else {
                "Delete permanently (blocked: permanent deletion is disabled)".to_string()
            }
        }
        Action::RunScript { command } => {
            format!("Run script: {}", tokens::resolve(command, ctx))
        }
        Action::Notify { message } => {
            format!("Notify: {}", tokens::resolve(message, ctx))
        }
        Action::Open => "Open".to_string(),
        Action::OpenWith { app } => format!("Open with {}", app),
        Action::ShowInFileManager => "Show in file manager".to_string(),
        Action::MakePdfSearchable => {
            if settings.ocr_enabled {
                "Make PDF searchable".to_string()
            } else {
                "Make PDF searchable (blocked: OCR is disabled)".to_string()
            }
        }
        Action::Pause { seconds } => format!("Pause for {}s", seconds),
        Action::Continue => "Continue to the next rule".to_string(),
        Action::Ignore => "Ignore this file (stop here)".to_string(),
    }
}

fn conflict_note(policy: ConflictResolution) -> &'static str {
    match policy {
        ConflictResolution::Rename => "",
        ConflictResolution::Replace => " (replacing existing files)",
        ConflictResolution::Skip => " (skipping on conflict)",
    }
}

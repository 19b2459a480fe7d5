use std::path::PathBuf;

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

pub fn confirm(title: &str, description: &str) -> bool {
    let answer = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::YesNo)
        .show();
    answer == MessageDialogResult::Yes
}

/// Save dialog preset with the artifact's filename. `None` when cancelled.
pub fn pick_save_path(filename: &str, extension: &str) -> Option<PathBuf> {
    FileDialog::new()
        .set_file_name(filename)
        .add_filter(extension.to_ascii_uppercase(), &[extension])
        .add_filter("All files", &["*"])
        .save_file()
}

use std::path::Path;

use crate::core::error::AppResult;
use crate::core::types::UserRecord;

/// File name of the `/fetch_users` document
pub const USERS_CSV_FILE_NAME: &str = "users.csv";

/// Quotes a field when it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Exports users to CSV, one row per user in the given order
pub fn users_to_csv(users: &[UserRecord]) -> String {
    let mut content = "user_id,first_name,username,joined_at,last_seen_at,approval_count\n".to_string();

    for user in users {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            user.user_id,
            csv_field(&user.first_name),
            csv_field(user.username.as_deref().unwrap_or("")),
            user.joined_at.to_rfc3339(),
            user.last_seen_at.to_rfc3339(),
            user.approval_count
        ));
    }

    content
}

/// Writes the users CSV to disk, for the `export-users` subcommand
pub fn write_users_csv(path: &Path, users: &[UserRecord]) -> AppResult<()> {
    fs_err::write(path, users_to_csv(users))?;
    Ok(())
}

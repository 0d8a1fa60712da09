use super::MailSession;

/// Trash folder names used by the big providers, tried after the preferred one.
const CONVENTIONAL_TRASH: [&str; 3] = ["[Gmail]/Trash", "Deleted Messages", "Deleted"];

fn candidates(preferred: &str) -> Vec<&str> {
    let mut names = vec![preferred];
    names.extend(
        CONVENTIONAL_TRASH
            .iter()
            .copied()
            .filter(|name| *name != preferred),
    );
    names
}

async fn folder_exists(session: &mut dyn MailSession, name: &str) -> bool {
    match session.list_folders(name).await {
        Ok(folders) => folders.iter().any(|f| {
            tracing::debug!("LIST {}: {} (delimiter {:?})", name, f.name, f.delimiter);
            f.name == name
        }),
        Err(e) => {
            tracing::debug!("LIST {} failed, treating as missing: {}", name, e);
            false
        }
    }
}

/// Returns the first existing trash candidate, creating `preferred` if none exists.
///
/// A failed CREATE still yields `preferred`; the later COPY will report the
/// problem per message.
pub async fn resolve_trash_folder(session: &mut dyn MailSession, preferred: &str) -> String {
    for name in candidates(preferred) {
        if folder_exists(session, name).await {
            tracing::info!("Using trash folder {}", name);
            return name.to_string();
        }
    }

    match session.create_folder(preferred).await {
        Ok(()) => tracing::info!("Created trash folder {}", preferred),
        Err(e) => tracing::warn!("Could not create trash folder {}: {}", preferred, e),
    }
    preferred.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imap::fake::{Call, FakeSession};

    #[test]
    fn preferred_name_is_tried_first_and_not_repeated() {
        assert_eq!(
            candidates("Trash"),
            vec!["Trash", "[Gmail]/Trash", "Deleted Messages", "Deleted"]
        );
        assert_eq!(
            candidates("Deleted"),
            vec!["Deleted", "[Gmail]/Trash", "Deleted Messages"]
        );
    }

    #[tokio::test]
    async fn returns_first_existing_candidate() {
        let mut session = FakeSession::default();
        session.folders.insert("Deleted Messages".to_string());
        session.folders.insert("Deleted".to_string());

        let folder = resolve_trash_folder(&mut session, "Trash").await;

        assert_eq!(folder, "Deleted Messages");
        assert_eq!(session.count(|c| matches!(c, Call::Create(_))), 0);
        assert_eq!(
            session.calls,
            vec![
                Call::List("Trash".to_string()),
                Call::List("[Gmail]/Trash".to_string()),
                Call::List("Deleted Messages".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn preferred_folder_wins_when_present() {
        let mut session = FakeSession::default();
        session.folders.insert("Spam".to_string());
        session.folders.insert("[Gmail]/Trash".to_string());

        assert_eq!(resolve_trash_folder(&mut session, "Spam").await, "Spam");
        assert_eq!(session.calls, vec![Call::List("Spam".to_string())]);
    }

    #[tokio::test]
    async fn creates_preferred_once_when_nothing_exists() {
        let mut session = FakeSession::default();

        let folder = resolve_trash_folder(&mut session, "Trash").await;

        assert_eq!(folder, "Trash");
        assert_eq!(session.count(|c| matches!(c, Call::Create(_))), 1);
        assert_eq!(session.calls.last(), Some(&Call::Create("Trash".to_string())));
    }

    #[tokio::test]
    async fn failed_create_still_returns_preferred() {
        let mut session = FakeSession {
            fail_create: true,
            ..FakeSession::default()
        };

        let folder = resolve_trash_folder(&mut session, "Junk").await;

        assert_eq!(folder, "Junk");
        assert_eq!(session.count(|c| matches!(c, Call::Create(_))), 1);
    }
}

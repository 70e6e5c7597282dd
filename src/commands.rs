//! Chat commands for managing followed Last.fm users.
//!
//! - `follow lastfm <username>`
//! - `forget lastfm <username>`
//! - `show lastfm users`

use crate::error::{AppError, Result};
use crate::registry::FollowOutcome;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Follow(String),
    Forget(String),
    ListUsers,
}

/// Where a command came from.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub room: String,
    pub requester: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResponse {
    pub replies: Vec<String>,
}

impl Command {
    /// Trigger words match case-insensitively; the username keeps its case.
    /// A leading bot mention is skipped: `@bot` always, `bot:` only when a
    /// full command follows it.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words: Vec<&str> = text.split_whitespace().collect();
        let is_mention = match words.first() {
            Some(first) if first.starts_with('@') => true,
            Some(first) => first.ends_with(':') && words.len() > 3,
            None => false,
        };
        if is_mention {
            words.remove(0);
        }

        match words.as_slice() {
            [verb, service, username]
                if service.eq_ignore_ascii_case("lastfm") && is_valid_username(username) =>
            {
                if verb.eq_ignore_ascii_case("follow") {
                    Some(Self::Follow(username.to_string()))
                } else if verb.eq_ignore_ascii_case("forget") {
                    Some(Self::Forget(username.to_string()))
                } else {
                    None
                }
            }
            [show, service, users]
                if show.eq_ignore_ascii_case("show")
                    && service.eq_ignore_ascii_case("lastfm")
                    && users.eq_ignore_ascii_case("users") =>
            {
                Some(Self::ListUsers)
            }
            _ => None,
        }
    }
}

/// Word characters with at most one dot.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.matches('.').count() <= 1
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

pub async fn execute(
    state: &AppState,
    command: Command,
    invocation: &Invocation,
) -> Result<CommandResponse> {
    let replies = match command {
        Command::Follow(username) => follow(state, &username, invocation).await?,
        Command::Forget(username) => forget(state, &username, invocation).await?,
        Command::ListUsers => vec![followed_users_message(&state.registry.list().await)],
    };

    Ok(CommandResponse { replies })
}

async fn follow(state: &AppState, username: &str, invocation: &Invocation) -> Result<Vec<String>> {
    let outcome = match state.registry.follow(&state.lastfm, username).await {
        Ok(outcome) => outcome,
        Err(AppError::LastFm(e)) => {
            tracing::warn!(user = username, "Could not verify user with Last.fm: {}", e);
            return Ok(vec![format!(
                "Last.fm could not verify {} right now. Try again in a bit.",
                username
            )]);
        }
        Err(e) => return Err(e),
    };

    let replies = match outcome {
        FollowOutcome::Added => {
            let replies = vec![
                format!(
                    "{} is now being followed. I'll report back any new Scrobbles ASAP!",
                    username
                ),
                followed_users_message(&state.registry.list().await),
            ];
            announce_elsewhere(
                state,
                invocation,
                &format!(
                    "{} has added {} to the Last.fm Notifier.",
                    invocation.requester, username
                ),
            )
            .await;
            replies
        }
        FollowOutcome::AlreadyFollowed => vec![
            format!("{} is already being followed.", username),
            followed_users_message(&state.registry.list().await),
        ],
        FollowOutcome::NotFound => vec![format!(
            "{} could not be found on Last.fm! Verify the username exists and has successfully scrobbled at least once. Then try again.",
            username
        )],
    };

    Ok(replies)
}

async fn forget(state: &AppState, username: &str, invocation: &Invocation) -> Result<Vec<String>> {
    state.registry.forget(username).await?;

    let replies = vec![
        "Who? Never heard of them.".to_string(),
        followed_users_message(&state.registry.list().await),
    ];

    announce_elsewhere(
        state,
        invocation,
        &format!(
            "{} has removed {} from the Last.fm Notifier.",
            invocation.requester, username
        ),
    )
    .await;

    Ok(replies)
}

/// Changes made inside the notification channel are already public there.
async fn announce_elsewhere(state: &AppState, invocation: &Invocation, text: &str) {
    if invocation.room == state.notifier.notify_channel() {
        tracing::debug!("No need to announce changes, they occurred in the notification channel");
        return;
    }
    state.notifier.announce(text).await;
}

pub fn followed_users_message(usernames: &[String]) -> String {
    let body: String = usernames.iter().map(|u| format!("{}\n", u)).collect();
    format!("I'm currently watching the following users:\n{}", body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("follow lastfm shadowplay"),
            Some(Command::Follow("shadowplay".to_string()))
        );
        assert_eq!(
            Command::parse("  FORGET LastFM Mr.Jones "),
            Some(Command::Forget("Mr.Jones".to_string()))
        );
        assert_eq!(Command::parse("Show LastFM Users"), Some(Command::ListUsers));
    }

    #[test]
    fn test_parse_strips_mention() {
        assert_eq!(
            Command::parse("@hubot follow lastfm alice"),
            Some(Command::Follow("alice".to_string()))
        );
        assert_eq!(Command::parse("hubot: show lastfm users"), Some(Command::ListUsers));
        assert_eq!(Command::parse("@hubot show lastfm users"), Some(Command::ListUsers));
        assert_eq!(
            Command::parse("hubot: forget lastfm alice"),
            Some(Command::Forget("alice".to_string()))
        );
    }

    #[test]
    fn test_parse_keeps_colon_on_command_word() {
        assert_eq!(Command::parse("forget: lastfm alice"), None);
        assert_eq!(Command::parse("follow: lastfm alice"), None);
        assert_eq!(Command::parse("show: lastfm users"), None);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Command::parse("follow lastfm a.b.c"), None);
        assert_eq!(Command::parse("follow lastfm al!ce"), None);
        assert_eq!(Command::parse("follow spotify alice"), None);
        assert_eq!(Command::parse("follow lastfm"), None);
        assert_eq!(Command::parse("unfollow lastfm alice"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_followed_users_message() {
        assert_eq!(
            followed_users_message(&["alice".to_string(), "bob".to_string()]),
            "I'm currently watching the following users:\nalice\nbob\n"
        );
        assert_eq!(
            followed_users_message(&[]),
            "I'm currently watching the following users:\n"
        );
    }
}

use std::path::Path;

use anyhow::{Result, bail};

use findyou_application::Notification;
use findyou_core::config::FindYouConfig;
use findyou_core::matching::LikeOutcome;
use findyou_core::user::ProfileStore;

use super::{Demo, session_for};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Swipe {
    Like { from: String, to: String },
    Dislike { from: String, to: String },
}

/// Parses `a+b,b-c` into swipes.
pub fn parse_actions(actions: &str) -> Result<Vec<Swipe>> {
    let mut swipes = Vec::new();
    for action in actions.split(',').map(str::trim).filter(|a| !a.is_empty()) {
        let swipe = if let Some((from, to)) = action.split_once('+') {
            Swipe::Like {
                from: from.trim().to_string(),
                to: to.trim().to_string(),
            }
        } else if let Some((from, to)) = action.split_once('-') {
            Swipe::Dislike {
                from: from.trim().to_string(),
                to: to.trim().to_string(),
            }
        } else {
            bail!("invalid action '{}', expected 'a+b' or 'a-b'", action);
        };
        swipes.push(swipe);
    }
    Ok(swipes)
}

pub async fn run(config: &FindYouConfig, seed: &Path, actions: &str) -> Result<()> {
    let swipes = parse_actions(actions)?;
    let demo = Demo::load(config, seed).await?;
    let mut notifications = demo.app.notifications();
    let mut users = Vec::new();

    for swipe in swipes {
        match &swipe {
            Swipe::Like { from, to } => {
                let result = demo.app.swipe().like(&session_for(from), to).await;
                match result {
                    Ok(LikeOutcome::Liked) => println!("{} likes {}", from, to),
                    Ok(LikeOutcome::Matched(channel)) => {
                        println!("{} likes {} -> match, chat {}", from, to, channel.channel_id)
                    }
                    Ok(LikeOutcome::AlreadyMatched) => {
                        println!("{} likes {} -> already matched", from, to)
                    }
                    Err(err) => println!("{} likes {} -> failed: {}", from, to, err),
                }
                users.extend([from.clone(), to.clone()]);
            }
            Swipe::Dislike { from, to } => {
                match demo.app.swipe().dislike(&session_for(from), to).await {
                    Ok(()) => println!("{} dislikes {}", from, to),
                    Err(err) => println!("{} dislikes {} -> failed: {}", from, to, err),
                }
                users.extend([from.clone(), to.clone()]);
            }
        }
        while let Ok(Notification { message, .. }) = notifications.try_recv() {
            println!("  [{}] {}", from_of(&swipe), message);
        }
    }

    users.sort();
    users.dedup();
    println!();
    for username in users {
        let Ok(record) = demo.memory.profiles.get_user(&username).await else {
            continue;
        };
        let chats = demo.app.chat().list_chats(&session_for(&username)).await?;
        let partners: Vec<_> = chats
            .iter()
            .map(|chat| chat.counterpart.display_name.as_str())
            .collect();
        println!(
            "{:<10} liked={:?} rejected={:?} matched={:?} chats with {:?}",
            username, record.liked, record.rejected, record.matched, partners
        );
    }
    Ok(())
}

fn from_of(swipe: &Swipe) -> &str {
    match swipe {
        Swipe::Like { from, .. } | Swipe::Dislike { from, .. } => from,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        let swipes = parse_actions("alice+bob, bob+alice,carol-alice,").unwrap();
        assert_eq!(
            swipes,
            vec![
                Swipe::Like {
                    from: "alice".into(),
                    to: "bob".into()
                },
                Swipe::Like {
                    from: "bob".into(),
                    to: "alice".into()
                },
                Swipe::Dislike {
                    from: "carol".into(),
                    to: "alice".into()
                },
            ]
        );
    }

    #[test]
    fn test_parse_actions_rejects_garbage() {
        assert!(parse_actions("alice>bob").is_err());
    }
}

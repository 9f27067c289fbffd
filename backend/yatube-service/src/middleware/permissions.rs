/// Authorization policy for yatube-service
///
/// A single pure decision function shared by every resource. It runs twice per
/// request: once against the collection (before any lookup) and, for
/// update/delete, once more against the loaded entity.
///
/// Rules, in order:
/// 1. No actor: deny as unauthenticated.
/// 2. Groups are read-only: list/read allowed, every write denied.
/// 3. list/read/create on posts and comments: allowed.
/// 4. update/delete on a post or comment entity: only its author.
use crate::error::{AppError, Result};
use crate::models::{Actor, Authored, Comment, Group, Post};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Post,
    Comment,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Actions that never change state.
    pub fn is_safe(self) -> bool {
        matches!(self, Action::List | Action::Read)
    }
}

/// What an action is aimed at.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Collection(ResourceKind),
    Entity {
        kind: ResourceKind,
        author: Option<&'a Actor>,
    },
}

impl<'a> Target<'a> {
    pub fn post(post: &'a Post) -> Self {
        Target::Entity {
            kind: ResourceKind::Post,
            author: Some(post.author()),
        }
    }

    pub fn comment(comment: &'a Comment) -> Self {
        Target::Entity {
            kind: ResourceKind::Comment,
            author: Some(comment.author()),
        }
    }

    pub fn group(_group: &'a Group) -> Self {
        Target::Entity {
            kind: ResourceKind::Group,
            author: None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Target::Collection(kind) | Target::Entity { kind, .. } => *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    NotOwner,
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn into_result(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial.into()),
        }
    }
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::Unauthenticated => AppError::Unauthorized,
            Denial::NotOwner => AppError::Forbidden,
            Denial::ReadOnly => AppError::MethodNotAllowed,
        }
    }
}

/// Decide whether `actor` may perform `action` on `target`.
pub fn authorize(actor: Option<&Actor>, action: Action, target: &Target<'_>) -> Decision {
    let Some(actor) = actor else {
        return Decision::Deny(Denial::Unauthenticated);
    };

    if target.kind() == ResourceKind::Group {
        return if action.is_safe() {
            Decision::Allow
        } else {
            Decision::Deny(Denial::ReadOnly)
        };
    }

    match (action, target) {
        (Action::List | Action::Read | Action::Create, _) => Decision::Allow,
        // Ownership can only be judged once the entity is loaded.
        (Action::Update | Action::Delete, Target::Collection(_)) => Decision::Allow,
        (Action::Update | Action::Delete, Target::Entity { author, .. }) => {
            match author {
                Some(author) if author.id == actor.id => Decision::Allow,
                _ => Decision::Deny(Denial::NotOwner),
            }
        }
    }
}

/// Run the policy and hand back the authenticated actor on success.
pub fn require<'a>(
    actor: Option<&'a Actor>,
    action: Action,
    target: &Target<'_>,
) -> Result<&'a Actor> {
    let decision = authorize(actor, action, target);
    if let Decision::Deny(denial) = decision {
        tracing::debug!(
            user_id = actor.map(|a| a.id),
            ?action,
            kind = ?target.kind(),
            ?denial,
            "authorization denied"
        );
    }
    decision.into_result()?;
    actor.ok_or(AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn actor(id: i64, username: &str) -> Actor {
        Actor {
            id,
            username: username.to_string(),
        }
    }

    fn post_by(author: &Actor) -> Post {
        Post {
            id: 1,
            text: "hello".to_string(),
            pub_date: Utc::now(),
            author: author.clone(),
            group_id: None,
            image: None,
        }
    }

    fn comment_by(author: &Actor) -> Comment {
        Comment {
            id: 7,
            text: "hi".to_string(),
            author: author.clone(),
            post_id: 1,
            created: Utc::now(),
        }
    }

    const ALL_ACTIONS: [Action; 5] = [
        Action::List,
        Action::Read,
        Action::Create,
        Action::Update,
        Action::Delete,
    ];

    #[test]
    fn anonymous_is_denied_everything() {
        let alice = actor(1, "alice");
        let post = post_by(&alice);
        let targets = [
            Target::Collection(ResourceKind::Post),
            Target::Collection(ResourceKind::Comment),
            Target::Collection(ResourceKind::Group),
            Target::post(&post),
        ];

        for target in &targets {
            for action in ALL_ACTIONS {
                assert_eq!(
                    authorize(None, action, target),
                    Decision::Deny(Denial::Unauthenticated),
                    "{action:?} on {target:?}"
                );
            }
        }
    }

    #[test]
    fn any_actor_may_read_and_create() {
        let alice = actor(1, "alice");
        let bob = actor(2, "bob");
        let post = post_by(&alice);

        for action in [Action::List, Action::Read, Action::Create] {
            assert_eq!(
                authorize(Some(&bob), action, &Target::Collection(ResourceKind::Post)),
                Decision::Allow
            );
            assert_eq!(
                authorize(Some(&bob), action, &Target::Collection(ResourceKind::Comment)),
                Decision::Allow
            );
        }
        assert_eq!(
            authorize(Some(&bob), Action::Read, &Target::post(&post)),
            Decision::Allow
        );
    }

    #[test]
    fn only_author_may_update_or_delete() {
        let alice = actor(1, "alice");
        let bob = actor(2, "bob");
        let post = post_by(&alice);
        let comment = comment_by(&bob);

        for action in [Action::Update, Action::Delete] {
            assert_eq!(
                authorize(Some(&alice), action, &Target::post(&post)),
                Decision::Allow
            );
            assert_eq!(
                authorize(Some(&bob), action, &Target::post(&post)),
                Decision::Deny(Denial::NotOwner)
            );
            // Comment ownership is judged by the comment author, not the post author.
            assert_eq!(
                authorize(Some(&alice), action, &Target::comment(&comment)),
                Decision::Deny(Denial::NotOwner)
            );
            assert_eq!(
                authorize(Some(&bob), action, &Target::comment(&comment)),
                Decision::Allow
            );
        }
    }

    #[test]
    fn collection_gate_defers_ownership() {
        let bob = actor(2, "bob");
        assert_eq!(
            authorize(Some(&bob), Action::Delete, &Target::Collection(ResourceKind::Post)),
            Decision::Allow
        );
    }

    #[test]
    fn groups_are_read_only() {
        let alice = actor(1, "alice");
        let group = Group {
            id: 1,
            title: "Cats".to_string(),
            slug: "cats".to_string(),
            description: String::new(),
        };

        for target in [Target::Collection(ResourceKind::Group), Target::group(&group)] {
            assert_eq!(authorize(Some(&alice), Action::List, &target), Decision::Allow);
            assert_eq!(authorize(Some(&alice), Action::Read, &target), Decision::Allow);
            for action in [Action::Create, Action::Update, Action::Delete] {
                assert_eq!(
                    authorize(Some(&alice), action, &target),
                    Decision::Deny(Denial::ReadOnly)
                );
            }
        }
    }

    #[test]
    fn require_returns_actor_or_mapped_error() {
        let alice = actor(1, "alice");
        let bob = actor(2, "bob");
        let post = post_by(&alice);

        let allowed = require(Some(&alice), Action::Update, &Target::post(&post)).unwrap();
        assert_eq!(allowed, &alice);

        assert!(matches!(
            require(Some(&bob), Action::Update, &Target::post(&post)),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            require(None, Action::Read, &Target::post(&post)),
            Err(AppError::Unauthorized)
        ));
    }
}

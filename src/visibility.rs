// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Role- and privilege-gated visibility of view fragments.
//!
//! A gate subscribes to the published current user for as long as its
//! handle lives, showing or hiding the attached view as the user changes.

use crate::models::{Privilege, Role, UserProfile};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// View fragment whose presence is toggled by a gate. Starts hidden.
pub trait ViewSlot: Send + 'static {
    fn show(&mut self);
    fn hide(&mut self);
}

/// Live subscription of a gate. Dropping it unsubscribes.
#[derive(Debug)]
pub struct VisibilityHandle {
    task: JoinHandle<()>,
}

impl VisibilityHandle {
    /// Stop reacting to user changes.
    pub fn detach(self) {}
}

impl Drop for VisibilityHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Shows a view only to users with one of the given roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleVisibility {
    roles: Vec<Role>,
}

impl RoleVisibility {
    pub fn new(role: Role) -> Self {
        Self { roles: vec![role] }
    }

    pub fn any_of(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }

    pub fn allows(&self, user: Option<&UserProfile>) -> bool {
        user.is_some_and(|u| self.roles.contains(&u.role))
    }

    pub fn attach<V: ViewSlot>(
        &self,
        users: watch::Receiver<Option<UserProfile>>,
        view: V,
    ) -> VisibilityHandle {
        let gate = self.clone();
        attach(users, view, move |user| gate.allows(user))
    }
}

/// Shows a view only to users holding a privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivilegeVisibility {
    privilege: Privilege,
}

impl PrivilegeVisibility {
    pub fn new(privilege: Privilege) -> Self {
        Self { privilege }
    }

    pub fn allows(&self, user: Option<&UserProfile>) -> bool {
        user.is_some_and(|u| u.has_privilege(self.privilege))
    }

    pub fn attach<V: ViewSlot>(
        &self,
        users: watch::Receiver<Option<UserProfile>>,
        view: V,
    ) -> VisibilityHandle {
        let gate = *self;
        attach(users, view, move |user| gate.allows(user))
    }
}

/// Evaluate now, then on every publication until the handle is dropped.
fn attach<V, F>(
    mut users: watch::Receiver<Option<UserProfile>>,
    mut view: V,
    allows: F,
) -> VisibilityHandle
where
    V: ViewSlot,
    F: Fn(Option<&UserProfile>) -> bool + Send + 'static,
{
    let mut shown = allows(users.borrow_and_update().as_ref());
    if shown {
        view.show();
    }

    let task = tokio::spawn(async move {
        while users.changed().await.is_ok() {
            let visible = allows(users.borrow_and_update().as_ref());
            if visible == shown {
                continue;
            }

            if visible {
                view.show();
            } else {
                view.hide();
            }
            shown = visible;
        }
    });

    VisibilityHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingView {
        events: Arc<Mutex<Vec<&'static str>>>,
    }

    impl RecordingView {
        fn events(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ViewSlot for RecordingView {
        fn show(&mut self) {
            self.events.lock().unwrap().push("show");
        }

        fn hide(&mut self) {
            self.events.lock().unwrap().push("hide");
        }
    }

    fn user(role: Role, privileges: &[Privilege]) -> UserProfile {
        UserProfile {
            id: "u1".to_string(),
            name: "Ana".to_string(),
            email: "ana@dojo.example".to_string(),
            role,
            privileges: Some(privileges.iter().copied().collect()),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_role_gate_toggles_on_publication() {
        let (tx, rx) = watch::channel(None);
        let view = RecordingView::default();
        let _handle =
            RoleVisibility::any_of([Role::Admin, Role::Webmaster]).attach(rx, view.clone());
        assert!(view.events().is_empty());

        tx.send_replace(Some(user(Role::Admin, &[])));
        settle().await;
        assert_eq!(view.events(), vec!["show"]);

        // Same visibility, no duplicate show.
        tx.send_replace(Some(user(Role::Webmaster, &[])));
        settle().await;
        assert_eq!(view.events(), vec!["show"]);

        tx.send_replace(None);
        settle().await;
        assert_eq!(view.events(), vec!["show", "hide"]);
    }

    #[tokio::test]
    async fn test_gate_evaluates_immediately() {
        let (_tx, rx) = watch::channel(Some(user(Role::User, &[])));
        let view = RecordingView::default();
        let _handle = RoleVisibility::new(Role::User).attach(rx, view.clone());
        assert_eq!(view.events(), vec!["show"]);
    }

    #[tokio::test]
    async fn test_privilege_gate() {
        let (tx, rx) = watch::channel(Some(user(Role::Admin, &[])));
        let view = RecordingView::default();
        let _handle = PrivilegeVisibility::new(Privilege::ManageUsers).attach(rx, view.clone());
        assert!(view.events().is_empty());

        tx.send_replace(Some(user(Role::Admin, &[Privilege::ManageUsers])));
        settle().await;
        assert_eq!(view.events(), vec!["show"]);
    }

    #[tokio::test]
    async fn test_detach_unsubscribes() {
        let (tx, rx) = watch::channel(None);
        let view = RecordingView::default();
        let handle = RoleVisibility::new(Role::User).attach(rx, view.clone());

        handle.detach();
        settle().await;

        tx.send_replace(Some(user(Role::User, &[])));
        settle().await;
        assert!(view.events().is_empty());
        assert_eq!(tx.receiver_count(), 0);
    }
}

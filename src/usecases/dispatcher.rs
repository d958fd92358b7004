//! Explicit dispatch table: (command | predicate) -> handler, built once at startup.
//!
//! First matching route wins. Each matched handler runs in its own task so a
//! history scan never blocks direct uploads.

use crate::domain::command::split_command;
use crate::domain::Message;
use crate::ports::{IncomingPort, MessageHandler};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

/// What a route matches on.
pub enum Route {
    /// `/name` or `/name@bot`.
    Command(&'static str),
    /// Any non-command message the predicate accepts.
    Predicate(fn(&Message) -> bool),
}

/// Where a route is allowed to fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Private,
    Any,
}

struct Entry {
    route: Route,
    scope: Scope,
    handler: Arc<dyn MessageHandler>,
}

#[derive(Default)]
pub struct Dispatcher {
    entries: Vec<Entry>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route: Route, scope: Scope, handler: Arc<dyn MessageHandler>) -> Self {
        self.entries.push(Entry {
            route,
            scope,
            handler,
        });
        self
    }

    /// Handler and its argument text for `message`, if any route matches.
    pub fn resolve(&self, message: &Message) -> Option<(Arc<dyn MessageHandler>, String)> {
        let command = split_command(&message.text);
        self.entries
            .iter()
            .filter(|e| e.scope == Scope::Any || message.is_private())
            .find_map(|e| match (&e.route, command) {
                (Route::Command(name), Some((cmd, args))) if *name == cmd => {
                    Some((Arc::clone(&e.handler), args.to_string()))
                }
                (Route::Predicate(accepts), None) if accepts(message) => {
                    Some((Arc::clone(&e.handler), String::new()))
                }
                _ => None,
            })
    }
}

#[async_trait]
impl IncomingPort for Dispatcher {
    async fn on_message(&self, message: Message) {
        let Some((handler, args)) = self.resolve(&message) else {
            debug!(chat_id = message.chat_id, msg_id = message.id, "no route");
            return;
        };
        tokio::spawn(async move {
            let (chat_id, msg_id) = (message.chat_id, message.id);
            if let Err(e) = handler.handle(message, args).await {
                error!(chat_id, msg_id, error = %e, "handler failed");
            }
        });
    }
}

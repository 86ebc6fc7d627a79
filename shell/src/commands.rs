//! The shell's command tree and the guards attached to it.
//!
//! ```text
//! whoami
//! group                          list groups
//! group <name>                   show members        guard: known user, resolve group
//! group <name> add <user>        add a member        guard: admin
//! group <name> remove <user>     remove a member     guard: admin
//! repeat <count> <text>          echo text           guard: clamp count
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cmdguard::codes;
use cmdguard::core::guard::require;
use cmdguard::{
    ArgumentRef, BuildError, CommandTree, CommandTreeBuilder, GuardHandle, GuardResult,
};
use tracing::debug;

use crate::config::ShellConfig;
use crate::directory::{Directory, Group};

pub const NAME: &str = "name";
pub const USER: &str = "user";
pub const COUNT: &str = "count";
pub const TEXT: &str = "text";

/// State shared by every guard and handler of one shell run.
pub struct Session {
    user: String,
    repeat_limit: i64,
    directory: Mutex<Directory>,
    output: Mutex<Vec<String>>,
}

impl Session {
    pub fn new(user: &str, config: &ShellConfig) -> Self {
        Self {
            user: user.to_string(),
            repeat_limit: config.repeat_limit,
            directory: Mutex::new(Directory::from_config(config)),
            output: Mutex::new(Vec::new()),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    fn directory(&self) -> MutexGuard<'_, Directory> {
        self.directory
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn say(&self, line: impl Into<String>) {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.into());
    }

    /// Drain the lines produced so far.
    pub fn take_output(&self) -> Vec<String> {
        std::mem::take(&mut *self.output.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

fn known_user(session: &Arc<Session>) -> GuardHandle {
    let session = Arc::clone(session);
    GuardHandle::from_fn(move |_| {
        if session.directory().is_known(session.user()) {
            return Ok(GuardResult::Continue);
        }
        session.say(format!("{}: not a known user", session.user()));
        Ok(GuardResult::abort())
    })
}

/// Swap the raw group name for the [`Group`] it names.
fn resolve_group(session: &Arc<Session>, raw: ArgumentRef<String>) -> GuardHandle {
    let session = Arc::clone(session);
    GuardHandle::from_fn(move |ctx| {
        let name = raw.read(ctx)?;
        let found = session.directory().group(&name).cloned();
        match found {
            Some(group) => {
                debug!(group = %name, "resolved group");
                ctx.set(raw.name(), group);
                Ok(GuardResult::Continue)
            }
            None => {
                session.say(format!("unknown group '{}'", name));
                Ok(GuardResult::abort())
            }
        }
    })
}

fn admin_only(session: &Arc<Session>, action: &'static str) -> GuardHandle {
    let session = Arc::clone(session);
    require(
        move |_| {
            let allowed = session.directory().is_admin(session.user());
            if !allowed {
                session.say(format!(
                    "{}: only admins may {} members",
                    session.user(),
                    action
                ));
            }
            Ok(allowed)
        },
        codes::NO_SUCCESS,
    )
}

/// Reject non-positive counts and clamp large ones to the configured limit.
fn clamp_count(session: &Arc<Session>, count: ArgumentRef<i64>) -> GuardHandle {
    let session = Arc::clone(session);
    GuardHandle::from_fn(move |ctx| {
        let requested = count.read(ctx)?;
        if requested < 1 {
            session.say("count must be positive");
            return Ok(GuardResult::abort());
        }
        if requested > session.repeat_limit {
            debug!(
                requested,
                limit = session.repeat_limit,
                "clamping repeat count"
            );
            count.write(ctx, session.repeat_limit);
        }
        Ok(GuardResult::Continue)
    })
}

pub fn build(session: &Arc<Session>) -> Result<CommandTree, BuildError> {
    let mut builder = CommandTreeBuilder::new();
    let root = builder.root();

    let whoami = builder.literal(root, "whoami")?;
    let s = Arc::clone(session);
    builder.executes(whoami, move |_| {
        s.say(s.user().to_string());
        Ok(codes::SUCCESS)
    })?;

    let group = builder.literal(root, "group")?;
    builder.guard_descendants(group, known_user(session))?;
    let s = Arc::clone(session);
    builder.executes(group, move |_| {
        let names: Vec<String> = s.directory().group_names().map(str::to_string).collect();
        for name in names {
            s.say(name);
        }
        Ok(codes::SUCCESS)
    })?;

    let name = builder.argument::<String>(group, NAME)?;
    let raw_name = builder.argument_ref::<String>(name, NAME)?;
    builder.guard(name, resolve_group(session, raw_name))?;
    let resolved = ArgumentRef::<Group>::bind(NAME);
    let s = Arc::clone(session);
    let shown = resolved.clone();
    builder.executes(name, move |inv| {
        let group = shown.read(inv.context())?;
        let members: Vec<&str> = group.members.iter().map(String::as_str).collect();
        s.say(format!("{}: {}", group.name, members.join(", ")));
        Ok(codes::SUCCESS)
    })?;

    let add = builder.literal(name, "add")?;
    builder.guard(add, admin_only(session, "add"))?;
    let add_user = builder.argument::<String>(add, USER)?;
    let user_ref = builder.argument_ref::<String>(add_user, USER)?;
    let s = Arc::clone(session);
    let target = resolved.clone();
    builder.executes(add_user, move |inv| {
        let group = target.read(inv.context())?;
        let user = user_ref.read(inv.context())?;
        if s.directory().add_member(&group.name, &user) {
            s.say(format!("added {} to {}", user, group.name));
            Ok(codes::SUCCESS)
        } else {
            s.say(format!("{} is already in {}", user, group.name));
            Ok(codes::NO_SUCCESS)
        }
    })?;

    let remove = builder.literal(name, "remove")?;
    builder.guard(remove, admin_only(session, "remove"))?;
    let remove_user = builder.argument::<String>(remove, USER)?;
    let user_ref = builder.argument_ref::<String>(remove_user, USER)?;
    let s = Arc::clone(session);
    builder.executes(remove_user, move |inv| {
        let group = resolved.read(inv.context())?;
        let user = user_ref.read(inv.context())?;
        if s.directory().remove_member(&group.name, &user) {
            s.say(format!("removed {} from {}", user, group.name));
            Ok(codes::SUCCESS)
        } else {
            s.say(format!("{} is not in {}", user, group.name));
            Ok(codes::NO_SUCCESS)
        }
    })?;

    let repeat = builder.literal(root, "repeat")?;
    let count = builder.argument::<i64>(repeat, COUNT)?;
    let count_ref = builder.argument_ref::<i64>(count, COUNT)?;
    builder.guard(count, clamp_count(session, count_ref.clone()))?;
    let text = builder.argument::<String>(count, TEXT)?;
    let text_ref = builder.argument_ref::<String>(text, TEXT)?;
    let s = Arc::clone(session);
    builder.executes(text, move |inv| {
        let times = count_ref.read(inv.context())?;
        let text = text_ref.read(inv.context())?;
        for _ in 0..times {
            s.say(text.clone());
        }
        Ok(codes::SUCCESS)
    })?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::resolve;
    use cmdguard::Dispatcher;

    fn config() -> ShellConfig {
        let mut config = ShellConfig::default();
        config.groups.insert(
            "staff".to_string(),
            vec!["alice".to_string(), "bob".to_string()],
        );
        config.repeat_limit = 3;
        config
    }

    fn run(user: &str, line: &str) -> (i32, Vec<String>) {
        let session = Arc::new(Session::new(user, &config()));
        let tree = build(&session).expect("build tree");
        let dispatcher = Dispatcher::new(tree, config().dispatch);
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let parse = resolve(dispatcher.tree(), &tokens).expect("resolve");
        let code = dispatcher.execute(&parse).expect("execute");
        (code, session.take_output())
    }

    #[test]
    fn whoami_runs_without_guards() {
        assert_eq!(run("guest", "whoami"), (codes::SUCCESS, vec!["guest".to_string()]));
    }

    #[test]
    fn listing_groups_skips_descendant_guard() {
        let (code, output) = run("mallory", "group");
        assert_eq!(code, codes::SUCCESS);
        assert_eq!(output, vec!["staff".to_string(), "wheel".to_string()]);
    }

    #[test]
    fn unknown_user_cannot_show_group() {
        let (code, output) = run("mallory", "group staff");
        assert_eq!(code, codes::NO_SUCCESS);
        assert_eq!(output, vec!["mallory: not a known user".to_string()]);
    }

    #[test]
    fn member_sees_resolved_group() {
        let (code, output) = run("alice", "group staff");
        assert_eq!(code, codes::SUCCESS);
        assert_eq!(output, vec!["staff: alice, bob".to_string()]);
    }

    #[test]
    fn unknown_group_aborts() {
        let (code, output) = run("alice", "group ops");
        assert_eq!(code, codes::NO_SUCCESS);
        assert_eq!(output, vec!["unknown group 'ops'".to_string()]);
    }

    #[test]
    fn non_admin_cannot_add() {
        let (code, output) = run("alice", "group staff add carol");
        assert_eq!(code, codes::NO_SUCCESS);
        assert_eq!(output, vec!["alice: only admins may add members".to_string()]);
    }

    #[test]
    fn admin_adds_and_removes() {
        assert_eq!(
            run("root", "group staff add carol"),
            (codes::SUCCESS, vec!["added carol to staff".to_string()])
        );
        assert_eq!(
            run("root", "group staff remove bob"),
            (codes::SUCCESS, vec!["removed bob from staff".to_string()])
        );
        assert_eq!(
            run("root", "group staff remove carol"),
            (codes::NO_SUCCESS, vec!["carol is not in staff".to_string()])
        );
    }

    #[test]
    fn repeat_count_is_clamped() {
        let (code, output) = run("guest", "repeat 10 hi");
        assert_eq!(code, codes::SUCCESS);
        assert_eq!(output, vec!["hi".to_string(); 3]);
    }

    #[test]
    fn repeat_rejects_non_positive_count() {
        let (code, output) = run("guest", "repeat 0 hi");
        assert_eq!(code, codes::NO_SUCCESS);
        assert_eq!(output, vec!["count must be positive".to_string()]);
    }
}

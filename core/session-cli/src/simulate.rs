//! Virtual-time session simulation.
//!
//! Mounts a full session context over in-memory collaborators, then plays
//! timers forward and prints one line per observable change.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use ahp_session_core::{
    default_config_path, load_config, AuthGateway, ClientConfig, Clock, JsonFileUserStore,
    ManualClock, ManualTimers, MemoryLocation, MemoryUserStore, NotificationKind,
    PersistedUserStore, SessionContext, SessionError, SessionStatus, User, UserRole,
};
use tracing::{debug, info};

const SIMULATION_URL: &str = "/?tab=my-projects";

pub struct SimulateArgs {
    pub expires_in: i64,
    pub warning_lead: Option<u64>,
    pub grace: Option<u64>,
    /// (at, lifetime) of a single extension request.
    pub extend: Option<(i64, i64)>,
    pub config: Option<PathBuf>,
    /// Cache the simulated user in the configured JSON user store.
    pub persist: bool,
}

struct ScriptedGateway {
    expiry: i64,
    refresh_to: Cell<Option<i64>>,
}

impl AuthGateway for ScriptedGateway {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn token_expiry_ms(&self) -> Option<i64> {
        Some(self.expiry)
    }

    fn refresh_token(&self) -> ahp_session_core::Result<i64> {
        self.refresh_to
            .take()
            .ok_or_else(|| SessionError::RefreshFailed {
                reason: "no refresh scripted".to_string(),
            })
    }

    fn logout(&self) -> ahp_session_core::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Snapshot {
    status: SessionStatus,
    notification: NotificationKind,
    tab: &'static str,
}

type Ctx<S> = SessionContext<ScriptedGateway, S, MemoryLocation>;

fn snapshot<S: PersistedUserStore>(ctx: &Ctx<S>) -> Snapshot {
    Snapshot {
        status: ctx.status(),
        notification: ctx.notification().kind,
        tab: ctx.navigation().active_tab.as_str(),
    }
}

fn format_line<S: PersistedUserStore>(at: i64, ctx: &Ctx<S>) -> String {
    let snap = snapshot(ctx);
    format!(
        "t=+{}ms status={} notification={:?} remaining={}ms tab={}",
        at,
        snap.status,
        snap.notification,
        ctx.notification().remaining_ms,
        snap.tab
    )
}

/// Loads the given config file, or `~/.ahp-client/config.json` when none
/// is given. A missing file yields defaults.
fn load_client_config(explicit: Option<&Path>) -> ahp_session_core::Result<ClientConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    debug!(path = %path.display(), "Loading client config");
    load_config(&path)
}

fn simulated_user() -> User {
    User {
        id: "simulated".to_string(),
        email: "simulated@localhost".to_string(),
        display_name: None,
        role: UserRole::ServiceUser,
    }
}

pub fn run(args: SimulateArgs) -> Result<(), String> {
    let mut config = load_client_config(args.config.as_deref()).map_err(String::from)?;
    if let Some(lead) = args.warning_lead {
        config.warning_lead_ms = lead;
    }
    if let Some(grace) = args.grace {
        config.expiry_grace_ms = grace;
    }

    let lines = if args.persist {
        let path = config.resolved_user_store_path().map_err(String::from)?;
        let store = JsonFileUserStore::new(path);
        store.save(&simulated_user()).map_err(String::from)?;
        simulate(&config, store, args.expires_in, args.extend)
    } else {
        let store = MemoryUserStore::with_user(simulated_user());
        simulate(&config, store, args.expires_in, args.extend)
    };

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

fn simulate<S: PersistedUserStore>(
    config: &ClientConfig,
    users: S,
    expires_in: i64,
    extend: Option<(i64, i64)>,
) -> Vec<String> {
    let clock = ManualClock::new(0);
    let timers = Rc::new(ManualTimers::new(clock.clone()));
    let gateway = ScriptedGateway {
        expiry: expires_in,
        refresh_to: Cell::new(extend.map(|(at, lifetime)| at.saturating_add(lifetime))),
    };

    let mut ctx: Ctx<S> = SessionContext::mount(
        config,
        gateway,
        users,
        MemoryLocation::new(SIMULATION_URL),
        Rc::new(clock.clone()),
        timers.clone(),
    );
    ctx.on_session_expired(|| info!("Application expiry hook ran"));

    let mut lines = vec![format_line(0, &ctx)];
    let mut last = snapshot(&ctx);
    let mut pending_extend = extend;

    loop {
        let stop = match (pending_extend, timers.next_due()) {
            (Some((at, _)), _) => at,
            (None, Some(due)) => due,
            (None, None) => break,
        };

        while let Some(timer) = timers.fire_next(stop) {
            ctx.handle_timer(timer);
            let current = snapshot(&ctx);
            if current != last {
                lines.push(format_line(clock.now_ms(), &ctx));
                last = current;
            }
        }
        if stop > clock.now_ms() {
            clock.set(stop);
        }

        if let Some((at, _)) = pending_extend.take() {
            match ctx.extend() {
                Ok(()) => lines.push(format!("t=+{}ms extend requested: ok", at)),
                Err(err) => lines.push(format!("t=+{}ms extend requested: {}", at, err)),
            }
            lines.push(format_line(clock.now_ms(), &ctx));
            last = snapshot(&ctx);
        }
    }

    ctx.unmount();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(lead: u64, grace: u64) -> ClientConfig {
        ClientConfig {
            warning_lead_ms: lead,
            expiry_grace_ms: grace,
            user_store_path: None,
        }
    }

    fn memory_users() -> MemoryUserStore {
        MemoryUserStore::with_user(simulated_user())
    }

    #[test]
    fn plain_lifecycle_prints_each_transition() {
        let lines = simulate(&config(5_000, 1_000), memory_users(), 60_000, None);
        assert_eq!(
            lines,
            vec![
                "t=+0ms status=authenticated notification=None remaining=0ms tab=my-projects",
                "t=+55000ms status=expiring notification=Warning remaining=5000ms tab=my-projects",
                "t=+60000ms status=expired notification=Expired remaining=0ms tab=my-projects",
                "t=+61000ms status=anonymous notification=None remaining=0ms tab=login",
            ]
        );
    }

    #[test]
    fn extension_pushes_expiry_out() {
        let lines = simulate(
            &config(5_000, 1_000),
            memory_users(),
            60_000,
            Some((56_000, 60_000)),
        );
        assert!(lines.contains(&"t=+56000ms extend requested: ok".to_string()));
        assert!(lines
            .iter()
            .any(|line| line.starts_with("t=+111000ms status=expiring")));
        assert!(lines.last().is_some_and(|line| line.contains("tab=login")));
    }

    #[test]
    fn short_token_warns_immediately() {
        let lines = simulate(&config(5_000, 1_000), memory_users(), 2_000, None);
        assert!(lines[0].contains("status=expiring notification=Warning remaining=2000ms"));
    }

    #[test]
    fn huge_extension_saturates_instead_of_overflowing() {
        let lines = simulate(
            &config(5_000, 1_000),
            memory_users(),
            60_000,
            Some((56_000, i64::MAX)),
        );
        let extended = lines
            .iter()
            .position(|line| line == "t=+56000ms extend requested: ok")
            .expect("extend line");
        assert!(lines[extended + 1].starts_with("t=+56000ms status=authenticated"));
        assert!(lines.last().is_some_and(|line| line.contains("tab=login")));
    }

    #[test]
    fn config_file_drives_timing_and_user_store() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let config_path = temp_dir.path().join("config.json");
        let user_path = temp_dir.path().join("user.json");
        std::fs::write(
            &config_path,
            serde_json::json!({
                "warning_lead_ms": 2_000,
                "expiry_grace_ms": 500,
                "user_store_path": user_path,
            })
            .to_string(),
        )
        .expect("write config");

        let loaded = load_client_config(Some(config_path.as_path())).expect("load config");
        assert_eq!(loaded, {
            let mut expected = config(2_000, 500);
            expected.user_store_path = Some(user_path.clone());
            expected
        });

        let store_path = loaded.resolved_user_store_path().expect("store path");
        let store = JsonFileUserStore::new(&store_path);
        store.save(&simulated_user()).expect("save user");
        assert_eq!(store.load(), Some(simulated_user()));

        let lines = simulate(&loaded, store, 10_000, None);
        assert_eq!(
            lines[1],
            "t=+8000ms status=expiring notification=Warning remaining=2000ms tab=my-projects"
        );
        assert!(lines[3].starts_with("t=+10500ms status=anonymous"));
        assert_eq!(JsonFileUserStore::new(&store_path).load(), None);
    }

    #[test]
    fn missing_config_file_yields_defaults() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let absent = temp_dir.path().join("absent.json");
        let loaded = load_client_config(Some(absent.as_path())).expect("defaults");
        assert_eq!(loaded, ClientConfig::default());
    }
}

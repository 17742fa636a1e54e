//! In-process fake of the systemd D-Bus service
//!
//! Serves org.freedesktop.systemd1.{Manager,Unit,Service,Job} from a zbus
//! object server on one end of a peer-to-peer socket pair. The other end is
//! handed to the library as its bus connection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_io::Async;
use sysdbus::{BusOptions, SystemBus};
use zbus::connection::Builder;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};
use zbus::{interface, Connection, DBusError, Guid};

pub const MANAGER_PATH: &str = "/org/freedesktop/systemd1";
pub const UNIT_INTERFACE: &str = "org.freedesktop.systemd1.Unit";
pub const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, DBusError)]
#[zbus(prefix = "org.freedesktop.systemd1")]
pub enum SystemdFault {
    #[zbus(error)]
    ZBus(zbus::Error),
    NoSuchUnit(String),
    NoSuchJob(String),
}

#[derive(Debug, Clone)]
pub struct FakeUnit {
    pub name: String,
    pub description: String,
    pub load_state: String,
    pub active_state: String,
    pub sub_state: String,
}

impl FakeUnit {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            load_state: "loaded".into(),
            active_state: "inactive".into(),
            sub_state: "dead".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeJob {
    pub id: u32,
    pub unit: String,
    pub job_type: String,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub units: Vec<FakeUnit>,
    pub jobs: Vec<FakeJob>,
    pub cancelled_jobs: Vec<u32>,
    pub unit_files: HashMap<String, String>,
    pub default_target: String,
    pub environment: Vec<String>,
    pub subscribed: bool,
    pub next_job_id: u32,
}

impl FakeState {
    fn unit(&self, name: &str) -> Result<&FakeUnit, SystemdFault> {
        self.units
            .iter()
            .find(|u| u.name == name)
            .ok_or_else(|| SystemdFault::NoSuchUnit(format!("Unit {} not loaded.", name)))
    }

    fn unit_mut(&mut self, name: &str) -> Result<&mut FakeUnit, SystemdFault> {
        self.units
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| SystemdFault::NoSuchUnit(format!("Unit {} not loaded.", name)))
    }

    fn next_job(&mut self) -> u32 {
        self.next_job_id += 1;
        self.next_job_id
    }
}

pub type SharedState = Arc<Mutex<FakeState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, FakeState> {
    state.lock().unwrap()
}

/// Convert unit name to D-Bus object path string
/// e.g., "docker.service" -> "/org/freedesktop/systemd1/unit/docker_2eservice"
pub fn unit_object_path(unit_id: &str) -> String {
    let escaped: String = unit_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c.to_string()
            } else {
                format!("_{:02x}", c as u32)
            }
        })
        .collect();

    format!("/org/freedesktop/systemd1/unit/{}", escaped)
}

pub fn job_object_path(id: u32) -> String {
    format!("/org/freedesktop/systemd1/job/{}", id)
}

fn owned_path(s: String) -> OwnedObjectPath {
    ObjectPath::try_from(s).unwrap().into()
}

/// Register a job object and record it as queued
async fn queue_job(
    conn: &Connection,
    state: &SharedState,
    unit: &str,
    job_type: &str,
) -> Result<OwnedObjectPath, SystemdFault> {
    let job = {
        let mut st = lock(state);
        let id = st.next_job();
        let job = FakeJob {
            id,
            unit: unit.to_string(),
            job_type: job_type.to_string(),
        };
        st.jobs.push(job.clone());
        job
    };

    let path = job_object_path(job.id);
    conn.object_server()
        .at(
            path.as_str(),
            JobInterface {
                state: state.clone(),
                job,
            },
        )
        .await
        .map_err(SystemdFault::ZBus)?;
    Ok(owned_path(path))
}

/// Path of a job that completed before the caller could look at it
fn finished_job_path(state: &SharedState) -> OwnedObjectPath {
    let id = lock(state).next_job();
    owned_path(job_object_path(id))
}

// ==================== Manager ====================

pub struct ManagerInterface {
    state: SharedState,
}

#[interface(name = "org.freedesktop.systemd1.Manager")]
impl ManagerInterface {
    async fn get_unit(&self, name: &str) -> Result<OwnedObjectPath, SystemdFault> {
        lock(&self.state).unit(name)?;
        Ok(owned_path(unit_object_path(name)))
    }

    async fn load_unit(&self, name: &str) -> Result<OwnedObjectPath, SystemdFault> {
        self.get_unit(name).await
    }

    #[zbus(name = "GetUnitByPID")]
    async fn get_unit_by_pid(&self, _pid: u32) -> Result<OwnedObjectPath, SystemdFault> {
        let st = lock(&self.state);
        let first = st
            .units
            .first()
            .ok_or_else(|| SystemdFault::NoSuchUnit("No unit for PID".into()))?;
        Ok(owned_path(unit_object_path(&first.name)))
    }

    async fn get_job(&self, id: u32) -> Result<OwnedObjectPath, SystemdFault> {
        let st = lock(&self.state);
        if st.jobs.iter().any(|j| j.id == id) {
            Ok(owned_path(job_object_path(id)))
        } else {
            Err(SystemdFault::NoSuchJob(format!("Job {} does not exist.", id)))
        }
    }

    async fn start_unit(
        &self,
        #[zbus(connection)] conn: &Connection,
        name: &str,
        _mode: &str,
    ) -> Result<OwnedObjectPath, SystemdFault> {
        {
            let mut st = lock(&self.state);
            let unit = st.unit_mut(name)?;
            unit.active_state = "active".into();
            unit.sub_state = "running".into();
        }
        queue_job(conn, &self.state, name, "start").await
    }

    async fn stop_unit(
        &self,
        #[zbus(connection)] conn: &Connection,
        name: &str,
        _mode: &str,
    ) -> Result<OwnedObjectPath, SystemdFault> {
        {
            let mut st = lock(&self.state);
            let unit = st.unit_mut(name)?;
            unit.active_state = "inactive".into();
            unit.sub_state = "dead".into();
        }
        queue_job(conn, &self.state, name, "stop").await
    }

    /// Reload finishes synchronously: the returned job object never exists
    async fn reload_unit(&self, name: &str, _mode: &str) -> Result<OwnedObjectPath, SystemdFault> {
        lock(&self.state).unit(name)?;
        Ok(finished_job_path(&self.state))
    }

    async fn kill_unit(&self, name: &str, _whom: &str, _signal: i32) -> Result<(), SystemdFault> {
        lock(&self.state).unit(name)?;
        Ok(())
    }

    async fn list_units(
        &self,
    ) -> Vec<(
        String,
        String,
        String,
        String,
        String,
        String,
        OwnedObjectPath,
        u32,
        String,
        OwnedObjectPath,
    )> {
        lock(&self.state)
            .units
            .iter()
            .map(|u| {
                (
                    u.name.clone(),
                    u.description.clone(),
                    u.load_state.clone(),
                    u.active_state.clone(),
                    u.sub_state.clone(),
                    String::new(),
                    owned_path(unit_object_path(&u.name)),
                    0,
                    String::new(),
                    owned_path("/".into()),
                )
            })
            .collect()
    }

    async fn list_jobs(&self) -> Vec<(u32, String, String, String, OwnedObjectPath, OwnedObjectPath)> {
        lock(&self.state)
            .jobs
            .iter()
            .map(|j| {
                (
                    j.id,
                    j.unit.clone(),
                    j.job_type.clone(),
                    "running".to_string(),
                    owned_path(job_object_path(j.id)),
                    owned_path(unit_object_path(&j.unit)),
                )
            })
            .collect()
    }

    async fn subscribe(&self) {
        lock(&self.state).subscribed = true;
    }

    async fn unsubscribe(&self) {
        lock(&self.state).subscribed = false;
    }

    async fn set_environment(&self, assignments: Vec<String>) {
        lock(&self.state).environment.extend(assignments);
    }

    async fn enable_unit_files(
        &self,
        files: Vec<String>,
        _runtime: bool,
        _force: bool,
    ) -> (bool, Vec<(String, String, String)>) {
        let mut st = lock(&self.state);
        let mut changes = Vec::new();
        for file in files {
            changes.push((
                "symlink".to_string(),
                format!("/etc/systemd/system/multi-user.target.wants/{}", file),
                format!("/usr/lib/systemd/system/{}", file),
            ));
            st.unit_files.insert(file, "enabled".into());
        }
        (true, changes)
    }

    async fn disable_unit_files(&self, files: Vec<String>, _runtime: bool) -> Vec<(String, String, String)> {
        let mut st = lock(&self.state);
        files
            .into_iter()
            .map(|file| {
                let change = (
                    "unlink".to_string(),
                    format!("/etc/systemd/system/multi-user.target.wants/{}", file),
                    String::new(),
                );
                st.unit_files.insert(file, "disabled".into());
                change
            })
            .collect()
    }

    async fn list_unit_files(&self) -> Vec<(String, String)> {
        let mut files: Vec<_> = lock(&self.state)
            .unit_files
            .iter()
            .map(|(name, state)| (format!("/usr/lib/systemd/system/{}", name), state.clone()))
            .collect();
        files.sort();
        files
    }

    async fn get_unit_file_state(&self, file: &str) -> Result<String, SystemdFault> {
        lock(&self.state)
            .unit_files
            .get(file)
            .cloned()
            .ok_or_else(|| SystemdFault::NoSuchUnit(format!("No such file {}", file)))
    }

    async fn set_default_target(&self, name: &str, _force: bool) -> Vec<(String, String, String)> {
        lock(&self.state).default_target = name.to_string();
        vec![(
            "symlink".to_string(),
            "/etc/systemd/system/default.target".to_string(),
            format!("/usr/lib/systemd/system/{}", name),
        )]
    }

    async fn get_default_target(&self) -> String {
        lock(&self.state).default_target.clone()
    }

    #[zbus(property)]
    async fn version(&self) -> String {
        "fake-systemd 255".to_string()
    }

    #[zbus(property, name = "NNames")]
    async fn n_names(&self) -> u32 {
        lock(&self.state).units.len() as u32
    }

    #[zbus(property, name = "NJobs")]
    async fn n_jobs(&self) -> u32 {
        lock(&self.state).jobs.len() as u32
    }
}

// ==================== Unit ====================

pub struct UnitInterface {
    state: SharedState,
    name: String,
}

impl UnitInterface {
    fn read<T>(&self, f: impl FnOnce(&FakeUnit) -> T) -> T {
        let st = lock(&self.state);
        let unit = st.unit(&self.name).expect("served unit is in state");
        f(unit)
    }
}

#[interface(name = "org.freedesktop.systemd1.Unit")]
impl UnitInterface {
    async fn start(&self, #[zbus(connection)] conn: &Connection, _mode: &str) -> Result<OwnedObjectPath, SystemdFault> {
        {
            let mut st = lock(&self.state);
            let unit = st.unit_mut(&self.name)?;
            unit.active_state = "active".into();
            unit.sub_state = "running".into();
        }
        queue_job(conn, &self.state, &self.name, "start").await
    }

    async fn reload(&self, _mode: &str) -> OwnedObjectPath {
        finished_job_path(&self.state)
    }

    async fn kill(&self, _whom: &str, _signal: i32) {}

    #[zbus(property)]
    async fn id(&self) -> String {
        self.name.clone()
    }

    #[zbus(property)]
    async fn description(&self) -> String {
        self.read(|u| u.description.clone())
    }

    #[zbus(property)]
    async fn load_state(&self) -> String {
        self.read(|u| u.load_state.clone())
    }

    #[zbus(property)]
    async fn active_state(&self) -> String {
        self.read(|u| u.active_state.clone())
    }

    #[zbus(property)]
    async fn sub_state(&self) -> String {
        self.read(|u| u.sub_state.clone())
    }
}

// ==================== Service ====================

pub struct ServiceInterface {
    main_pid: u32,
}

#[interface(name = "org.freedesktop.systemd1.Service")]
impl ServiceInterface {
    #[zbus(property, name = "MainPID")]
    async fn main_pid(&self) -> u32 {
        self.main_pid
    }

    #[zbus(property)]
    async fn result(&self) -> String {
        "success".to_string()
    }
}

// ==================== Job ====================

pub struct JobInterface {
    state: SharedState,
    job: FakeJob,
}

#[interface(name = "org.freedesktop.systemd1.Job")]
impl JobInterface {
    async fn cancel(&self) {
        lock(&self.state).cancelled_jobs.push(self.job.id);
    }

    #[zbus(property)]
    async fn id(&self) -> u32 {
        self.job.id
    }

    #[zbus(property)]
    async fn job_type(&self) -> String {
        self.job.job_type.clone()
    }

    #[zbus(property)]
    async fn state(&self) -> String {
        "running".to_string()
    }
}

// ==================== Fixture ====================

pub struct Fixture {
    pub bus: SystemBus,
    pub server: Connection,
    pub state: SharedState,
}

impl Fixture {
    /// Fake systemd with the given `(name, description)` units loaded
    pub async fn start(units: &[(&str, &str)], opts: BusOptions) -> Self {
        let state: SharedState = Arc::new(Mutex::new(FakeState {
            units: units.iter().map(|(n, d)| FakeUnit::new(n, d)).collect(),
            default_target: "graphical.target".into(),
            ..Default::default()
        }));

        let (client_sock, server_sock) = UnixStream::pair().unwrap();

        let client_sock = Async::new(client_sock).unwrap();
        let server_sock = Async::new(server_sock).unwrap();

        let mut server = Builder::socket(server_sock)
            .server(Guid::generate())
            .unwrap()
            .p2p()
            .serve_at(MANAGER_PATH, ManagerInterface { state: state.clone() })
            .unwrap();
        for (name, _) in units {
            server = server
                .serve_at(
                    unit_object_path(name),
                    UnitInterface {
                        state: state.clone(),
                        name: name.to_string(),
                    },
                )
                .unwrap();
            if name.ends_with(".service") {
                server = server
                    .serve_at(unit_object_path(name), ServiceInterface { main_pid: 4242 })
                    .unwrap();
            }
        }

        let (client, server) = tokio::try_join!(Builder::socket(client_sock).p2p().build(), server.build()).unwrap();

        Self {
            bus: SystemBus::from_connection(client, &opts),
            server,
            state,
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        lock(&self.state)
    }

    /// Change a unit's state behind the client's back, without signalling
    pub fn set_active_state(&self, name: &str, active: &str, sub: &str) {
        let mut st = self.state();
        let unit = st.unit_mut(name).unwrap();
        unit.active_state = active.into();
        unit.sub_state = sub.into();
    }

    /// Emit PropertiesChanged for a unit's Unit interface
    pub async fn announce_unit_change(&self, name: &str) {
        let changed: HashMap<&str, Value<'_>> = HashMap::new();
        let invalidated: Vec<&str> = vec!["ActiveState", "SubState"];
        self.server
            .emit_signal(
                None::<&str>,
                unit_object_path(name).as_str(),
                "org.freedesktop.DBus.Properties",
                "PropertiesChanged",
                &(UNIT_INTERFACE, changed, invalidated),
            )
            .await
            .unwrap();
    }
}

/// Default options for tests: watch nothing implicitly
pub fn options() -> BusOptions {
    BusOptions::default().with_watch_by_default(false)
}

pub const UNITS: &[(&str, &str)] = &[
    ("nginx.service", "A high performance web server"),
    ("sshd.service", "OpenSSH Daemon"),
    ("dbus.socket", "D-Bus System Message Bus Socket"),
    ("multi-user.target", "Multi-User System"),
    ("logrotate.timer", "Daily rotation of log files"),
];

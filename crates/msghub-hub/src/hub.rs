//! The hub and its serialized executor.
//!
//! A [`Hub`] is a cheap, cloneable handle. Every operation it offers is
//! submitted as a [`Command`] onto one bounded FIFO and executed, one at a
//! time and to completion, by a single executor task that owns [`HubCore`].
//! That task is the only code that ever touches the agent and service
//! registries, which is what makes them safe without locks. Submitting waits
//! when the command queue is full.
//!
//! ```text
//! reader 1 ─┐
//! reader 2 ─┼─► mpsc<Command> ─► executor (HubCore) ─► agent outbound queues ─► writers
//! reader N ─┘
//! ```

use crate::agent::{Agent, Registration};
use crate::hooks::{CounterIdGenerator, HubHooks, IdGenerator, NoopHooks, SendFailure};
use crate::queue::{EnqueueError, OutboundQueue};
use crate::service::Service;
use crate::transport::ConnectionGuard;
use msghub_types::{HubConfig, HubError, HubResult, Id, Message, OverflowPolicy};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How many times registration asks the generator for an unused id.
const MAX_ID_ATTEMPTS: usize = 16;

type ExecFn<U> = Box<dyn FnOnce(&mut HubCore<U>) + Send>;

/// Operations processed by the executor.
pub(crate) enum Command<U> {
    RegisterAgent {
        connection: Arc<ConnectionGuard>,
        reply: oneshot::Sender<HubResult<Registration>>,
    },
    UnregisterAgent {
        id: Id,
    },
    Send {
        msg: Message,
        reply: Option<oneshot::Sender<bool>>,
    },
    RegisterService {
        id: Id,
        service: Arc<dyn Service<U>>,
    },
    UnregisterService {
        id: Id,
        reply: oneshot::Sender<bool>,
    },
    Exec(ExecFn<U>),
}

/// Registries and routing state, owned by the executor.
pub struct HubCore<U = ()> {
    agents: HashMap<Id, Agent<U>>,
    services: HashMap<Id, Arc<dyn Service<U>>>,
    hooks: Arc<dyn HubHooks<U>>,
    id_generator: Box<dyn IdGenerator>,
    outbound_capacity: usize,
    overflow_policy: OverflowPolicy,
}

impl<U: Default + Send + 'static> HubCore<U> {
    fn new(
        config: &HubConfig,
        hooks: Arc<dyn HubHooks<U>>,
        id_generator: Box<dyn IdGenerator>,
    ) -> Self {
        Self {
            agents: HashMap::new(),
            services: HashMap::new(),
            hooks,
            id_generator,
            outbound_capacity: config.effective_outbound_capacity(),
            overflow_policy: config.overflow_policy,
        }
    }

    fn execute(&mut self, cmd: Command<U>) {
        match cmd {
            Command::RegisterAgent { connection, reply } => {
                let result = self.register_agent(connection);
                if let Err(Ok(registration)) = reply.send(result) {
                    // The connection gave up waiting; undo the registration.
                    self.unregister_agent(&registration.id);
                }
            }
            Command::UnregisterAgent { id } => {
                self.unregister_agent(&id);
            }
            Command::Send { msg, reply } => {
                let delivered = self.send(msg);
                if let Some(reply) = reply {
                    let _ = reply.send(delivered);
                }
            }
            Command::RegisterService { id, service } => {
                self.register_service(id, service);
            }
            Command::UnregisterService { id, reply } => {
                let _ = reply.send(self.unregister_service(&id));
            }
            Command::Exec(f) => f(self),
        }
    }

    /// Assign a fresh id to a new connection and create its agent record.
    pub fn register_agent(&mut self, connection: Arc<ConnectionGuard>) -> HubResult<Registration> {
        let id = self.fresh_id()?;
        let outbound = OutboundQueue::new(self.outbound_capacity, self.overflow_policy);
        let agent = Agent::new(id.clone(), outbound.clone(), connection);
        self.agents.insert(id.clone(), agent);
        info!(agent = %id, agents = self.agents.len(), "Agent registered");

        let hooks = Arc::clone(&self.hooks);
        hooks.on_connect(self, &id);

        Ok(Registration { id, outbound })
    }

    fn fresh_id(&mut self) -> HubResult<Id> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.id_generator.next_id();
            if !self.agents.contains_key(&id) {
                return Ok(id);
            }
            warn!(agent = %id, "Id generator returned a live agent id, retrying");
        }
        Err(HubError::DuplicateId(MAX_ID_ATTEMPTS))
    }

    /// Remove an agent, close its queue and its connection. No-op if absent.
    pub fn unregister_agent(&mut self, id: &Id) -> bool {
        let Some(agent) = self.agents.remove(id) else {
            return false;
        };
        agent.shutdown();
        info!(agent = %id, agents = self.agents.len(), "Agent unregistered");

        let hooks = Arc::clone(&self.hooks);
        hooks.on_disconnect(self, id);
        true
    }

    /// Route one message. Returns whether it reached a service or a queue.
    pub fn send(&mut self, msg: Message) -> bool {
        if msg.to.is_service() {
            self.send_to_service(msg)
        } else {
            self.send_to_agent(msg)
        }
    }

    fn send_to_service(&mut self, msg: Message) -> bool {
        let original = msg.clone();
        let mut msg = msg;
        let hooks = Arc::clone(&self.hooks);
        hooks.before_service(self, &mut msg);

        let Some(service) = self.services.get(&msg.to).cloned() else {
            self.report_failure(&original, SendFailure::NoSuchService);
            return false;
        };
        debug!(from = %msg.from, to = %msg.to, "Dispatching to service");
        service.handle(self, msg);
        true
    }

    fn send_to_agent(&mut self, msg: Message) -> bool {
        let queue = match self.agents.get(&msg.to) {
            Some(agent) => agent.outbound().clone(),
            None => {
                self.report_failure(&msg, SendFailure::NoSuchAgent);
                return false;
            }
        };
        debug!(from = %msg.from, to = %msg.to, "Queueing for agent");
        match queue.push(msg) {
            Ok(None) => true,
            Ok(Some(evicted)) => {
                self.report_failure(&evicted, SendFailure::Evicted);
                true
            }
            Err(EnqueueError::Full(msg)) => {
                self.report_failure(&msg, SendFailure::QueueFull);
                false
            }
            Err(EnqueueError::Closed(msg)) => {
                self.report_failure(&msg, SendFailure::QueueClosed);
                false
            }
        }
    }

    fn report_failure(&mut self, msg: &Message, reason: SendFailure) {
        debug!(from = %msg.from, to = %msg.to, %reason, "Message not delivered");
        let hooks = Arc::clone(&self.hooks);
        hooks.on_send_failure(self, msg, reason);
    }

    /// Add or replace a service.
    pub fn register_service(&mut self, id: Id, service: Arc<dyn Service<U>>) {
        if !id.is_service() {
            warn!(service = %id, "Service id lacks the service prefix and will never be routed");
        }
        info!(service = %id, "Service registered");
        self.services.insert(id, service);
    }

    pub fn unregister_service(&mut self, id: &Id) -> bool {
        self.services.remove(id).is_some()
    }
}

impl<U> HubCore<U> {
    pub fn agent(&self, id: impl AsRef<str>) -> Option<&Agent<U>> {
        self.agents.get(id.as_ref())
    }

    pub fn agent_mut(&mut self, id: impl AsRef<str>) -> Option<&mut Agent<U>> {
        self.agents.get_mut(id.as_ref())
    }

    /// Identifiers of all live agents, in no particular order.
    pub fn agent_ids(&self) -> Vec<Id> {
        self.agents.keys().cloned().collect()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn has_service(&self, id: impl AsRef<str>) -> bool {
        self.services.contains_key(id.as_ref())
    }
}

/// Handle for submitting commands to a running hub.
pub struct Hub<U = ()> {
    tx: mpsc::Sender<Command<U>>,
    config: Arc<HubConfig>,
}

impl<U> Clone for Hub<U> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<U: Default + Send + 'static> Hub<U> {
    pub fn builder() -> HubBuilder<U> {
        HubBuilder::new()
    }

    /// Start a hub with default hooks and no services.
    pub fn start(config: HubConfig) -> (Self, JoinHandle<()>) {
        HubBuilder::new().config(config).spawn()
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    async fn submit(&self, cmd: Command<U>) -> HubResult<()> {
        self.tx.send(cmd).await.map_err(|_| HubError::HubStopped)
    }

    /// Register a new connection and receive its id and outbound queue.
    pub async fn register_agent(&self, connection: Arc<ConnectionGuard>) -> HubResult<Registration> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::RegisterAgent { connection, reply }).await?;
        rx.await.map_err(|_| HubError::HubStopped)?
    }

    /// Deregister an agent. Does not wait for the command to run.
    pub async fn unregister_agent(&self, id: Id) -> HubResult<()> {
        self.submit(Command::UnregisterAgent { id }).await
    }

    /// Route a message and wait for the outcome.
    pub async fn send(&self, msg: Message) -> HubResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::Send {
            msg,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| HubError::HubStopped)
    }

    /// Route a message without waiting for the outcome.
    pub async fn post(&self, msg: Message) -> HubResult<()> {
        self.submit(Command::Send { msg, reply: None }).await
    }

    pub async fn register_service<S>(&self, id: impl Into<Id>, service: S) -> HubResult<()>
    where
        S: Service<U>,
    {
        self.submit(Command::RegisterService {
            id: id.into(),
            service: Arc::new(service),
        })
        .await
    }

    pub async fn unregister_service(&self, id: impl Into<Id>) -> HubResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.submit(Command::UnregisterService {
            id: id.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| HubError::HubStopped)
    }

    /// Queue an arbitrary operation on the executor without waiting for it.
    pub async fn submit_fn<F>(&self, f: F) -> HubResult<()>
    where
        F: FnOnce(&mut HubCore<U>) + Send + 'static,
    {
        self.submit(Command::Exec(Box::new(f))).await
    }

    /// Run an operation on the executor and return its result.
    pub async fn exec<F, T>(&self, f: F) -> HubResult<T>
    where
        F: FnOnce(&mut HubCore<U>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.submit_fn(move |core| {
            let _ = reply.send(f(core));
        })
        .await?;
        rx.await.map_err(|_| HubError::HubStopped)
    }

    /// Snapshot of the live agent ids.
    pub async fn agent_ids(&self) -> HubResult<Vec<Id>> {
        self.exec(|core| core.agent_ids()).await
    }
}

/// Builder for a [`Hub`].
pub struct HubBuilder<U = ()> {
    config: HubConfig,
    hooks: Arc<dyn HubHooks<U>>,
    id_generator: Box<dyn IdGenerator>,
    services: Vec<(Id, Arc<dyn Service<U>>)>,
}

impl<U: Default + Send + 'static> HubBuilder<U> {
    pub fn new() -> Self {
        Self {
            config: HubConfig::default(),
            hooks: Arc::new(NoopHooks),
            id_generator: Box::new(CounterIdGenerator::new()),
            services: Vec::new(),
        }
    }

    pub fn config(mut self, config: HubConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hooks<H: HubHooks<U>>(mut self, hooks: H) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn id_generator<G: IdGenerator>(mut self, generator: G) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    pub fn service<S: Service<U>>(mut self, id: impl Into<Id>, service: S) -> Self {
        let service: Arc<dyn Service<U>> = Arc::new(service);
        self.services.push((id.into(), service));
        self
    }

    /// Spawn the executor task and return a handle to it.
    ///
    /// The executor runs until every [`Hub`] handle has been dropped.
    pub fn spawn(self) -> (Hub<U>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(self.config.effective_command_capacity());
        let mut core = HubCore::new(&self.config, self.hooks, self.id_generator);
        for (id, service) in self.services {
            core.register_service(id, service);
        }
        let task = tokio::spawn(run_executor(core, rx));
        let hub = Hub {
            tx,
            config: Arc::new(self.config),
        };
        (hub, task)
    }
}

impl<U: Default + Send + 'static> Default for HubBuilder<U> {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_executor<U: Default + Send + 'static>(
    mut core: HubCore<U>,
    mut rx: mpsc::Receiver<Command<U>>,
) {
    debug!("Hub executor started");
    while let Some(cmd) = rx.recv().await {
        core.execute(cmd);
    }
    debug!(agents = core.agent_count(), "Hub executor stopped");
}

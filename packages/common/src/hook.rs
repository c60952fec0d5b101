use anyhow::Result;
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};

use crate::event::{Event, GenericEvent};

/// Typed hook, used for specific event type
#[async_trait]
pub trait Hook<E: Event>: Send + Sync {
    /// Hook identifier
    fn id(&self) -> &str;
    /// Get the topics this hook is interested in
    fn topics(&self) -> &[&str];

    async fn on_register(&self) -> Result<()> {
        Ok(())
    }
    async fn on_unregister(&self) -> Result<()> {
        Ok(())
    }
    async fn on_event(&self, e: &E) -> Result<HookAction>;
}

/// What a hook decided about the event it observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Let the remaining hooks run and the operation proceed.
    Pass,
    /// Veto the operation. Remaining hooks for the topic are skipped.
    Cancel,
}

impl HookAction {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HookAction::Cancel)
    }
}

/// Generic hook trait object for dynamic dispatch
#[async_trait]
pub trait GenericHook: Send + Sync {
    /// Hook identifier
    fn id(&self) -> &str;
    /// Get the topics this hook is interested in
    fn topics(&self) -> &[&str];

    async fn on_register(&self) -> Result<()> {
        Ok(())
    }
    async fn on_unregister(&self) -> Result<()> {
        Ok(())
    }
    async fn on_event(&self, e: &GenericEvent) -> Result<HookAction>;
}

/// Adapter to convert typed Hook<E> into GenericHook
pub struct HookAdapter<E: Event, H: Hook<E>> {
    hook: Arc<H>,
    _phantom: std::marker::PhantomData<E>,
}

#[async_trait]
impl<E: Event, H: Hook<E>> GenericHook for HookAdapter<E, H> {
    fn id(&self) -> &str {
        self.hook.id()
    }
    fn topics(&self) -> &[&str] {
        self.hook.topics()
    }
    async fn on_event(&self, generic_event: &GenericEvent) -> Result<HookAction> {
        let typed_event: E = E::from_generic_event(generic_event)?;
        self.hook.on_event(&typed_event).await
    }

    async fn on_register(&self) -> Result<()> {
        self.hook.on_register().await
    }

    async fn on_unregister(&self) -> Result<()> {
        self.hook.on_unregister().await
    }
}

/// Hook registry owned by a single service instance.
///
/// Hooks for a topic run in registration order, inline on the caller's task.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<String, Vec<Arc<dyn GenericHook>>>,
}

impl std::fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut topics: Vec<(&String, usize)> =
            self.hooks.iter().map(|(t, h)| (t, h.len())).collect();
        topics.sort();
        f.debug_struct("HookRegistry")
            .field("topics", &topics)
            .finish()
    }
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed hook to the registry
    pub async fn add_hook<E: Event + 'static, H: Hook<E> + 'static>(
        &mut self,
        hook: H,
    ) -> Result<()> {
        let adapter = Arc::new(HookAdapter::<E, H> {
            hook: Arc::new(hook),
            _phantom: std::marker::PhantomData,
        });
        self.add_generic_hook(adapter).await
    }

    /// Add a generic hook to the registry
    pub async fn add_generic_hook(&mut self, hook: Arc<dyn GenericHook>) -> Result<()> {
        hook.on_register().await?;
        for &topic in hook.topics() {
            self.hooks
                .entry(topic.to_string())
                .or_default()
                .push(hook.clone());
        }
        Ok(())
    }

    /// Remove a hook by its ID from every topic it subscribed to
    pub async fn remove_hook(&mut self, hook_id: &str) -> Result<()> {
        let mut removed: Option<Arc<dyn GenericHook>> = None;

        for hooks_list in self.hooks.values_mut() {
            if let Some(pos) = hooks_list.iter().position(|h| h.id() == hook_id) {
                removed = Some(hooks_list.remove(pos));
            }
        }
        self.hooks.retain(|_, list| !list.is_empty());

        match removed {
            Some(hook) => hook.on_unregister().await,
            None => Err(anyhow::anyhow!("Hook not found: {}", hook_id)),
        }
    }

    /// Number of hooks subscribed to `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.hooks.get(topic).map(Vec::len).unwrap_or(0)
    }

    /// Trigger all hooks for an event.
    ///
    /// Returns [`HookAction::Cancel`] as soon as one hook cancels; later hooks
    /// are not invoked. Hook errors abort the trigger and propagate.
    pub async fn trigger<E: Event>(&self, event: &E) -> Result<HookAction> {
        let topic = event.topic();
        let hooks = match self.hooks.get(topic) {
            Some(h) if !h.is_empty() => h,
            _ => return Ok(HookAction::Pass),
        };

        let generic_event = event.to_generic_event()?;
        for hook in hooks {
            match hook.on_event(&generic_event).await? {
                HookAction::Pass => {}
                HookAction::Cancel => {
                    tracing::debug!(topic, hook = hook.id(), "Event cancelled by hook");
                    return Ok(HookAction::Cancel);
                }
            }
        }

        Ok(HookAction::Pass)
    }
}

use std::{
    hash::Hash,
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
};

pub type HandleId = u64;

/// Reference counted id of a backend object (texture, program, buffer).
/// When the last clone drops the backend object is queued for release.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle(pub(crate) Arc<StrongHandle>);

impl Handle {
    pub(crate) fn new(id: HandleId, drop_sender: Sender<DropEvent>) -> Self {
        Self(Arc::new(StrongHandle { id, drop_sender }))
    }

    pub fn id(&self) -> HandleId {
        self.0.id
    }
}

#[derive(Debug)]
pub(crate) struct DropEvent(pub HandleId);

#[derive(Debug)]
pub(crate) struct StrongHandle {
    id: HandleId,
    drop_sender: Sender<DropEvent>,
}

impl Hash for StrongHandle {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        Hash::hash(&self.id, state)
    }
}

impl Eq for StrongHandle {}

impl PartialEq for StrongHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Drop for StrongHandle {
    fn drop(&mut self) {
        let _ = self.drop_sender.send(DropEvent(self.id));
    }
}

/// Hands out handles and collects the ids of dropped ones
pub(crate) struct HandleAllocator {
    next_id: HandleId,
    sender: Sender<DropEvent>,
    receiver: Receiver<DropEvent>,
}

impl Default for HandleAllocator {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            // 0 is reserved as "nothing bound"
            next_id: 1,
            sender,
            receiver,
        }
    }
}

impl HandleAllocator {
    pub(crate) fn alloc(&mut self) -> Handle {
        let id = self.next_id;
        self.next_id += 1;
        Handle::new(id, self.sender.clone())
    }

    /// Ids whose last handle was dropped since the previous call
    pub(crate) fn dropped(&self) -> Vec<HandleId> {
        let mut ids = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            ids.push(event.0);
        }
        ids
    }
}

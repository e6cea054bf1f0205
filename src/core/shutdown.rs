//! Process-wide shutdown as an explicit cancellation token
//!
//! Long-running stages poll `is_requested` at their suspension points;
//! the event pump can also await `requested`.

use std::sync::Arc;

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx: Arc::new(tx), rx }
    }

    /// Ask every holder of this token to stop
    pub fn request(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown has been requested
    pub async fn requested(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_seen_by_clones() {
        let token = Shutdown::new();
        let other = token.clone();
        assert!(!other.is_requested());

        token.request();
        assert!(other.is_requested());
    }

    #[tokio::test]
    async fn test_requested_resolves_after_request() {
        let token = Shutdown::new();
        let mut waiter = token.clone();

        let handle = tokio::spawn(async move {
            waiter.requested().await;
            true
        });
        token.request();

        assert!(handle.await.unwrap());
    }

    #[tokio::test]
    async fn test_requested_resolves_immediately_when_already_set() {
        let mut token = Shutdown::new();
        token.request();
        token.requested().await;
        assert!(token.is_requested());
    }
}

use std::fmt;

/// Callbacks registered for state-change notifications of type `E`
pub struct Observers<E> {
    callbacks: Vec<Box<dyn FnMut(&E)>>,
}

impl<E> Observers<E> {
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&E) + 'static,
    {
        self.callbacks.push(Box::new(callback));
    }

    pub fn notify(&mut self, event: &E) {
        for callback in self.callbacks.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribed", &self.callbacks.len())
            .finish()
    }
}

//! Recognized object list with whole-list replacement.

use std::ops::Deref;
use std::sync::Arc;

use simcam_wire::RecognizedObject;

/// Read-only view of one recognition list.
///
/// A snapshot stays valid after the list is replaced; the replaced entries
/// are released when the last snapshot referring to them is dropped.
#[derive(Debug, Clone)]
pub struct RecognitionSnapshot {
    objects: Arc<[RecognizedObject]>,
}

impl Deref for RecognitionSnapshot {
    type Target = [RecognizedObject];

    fn deref(&self) -> &Self::Target {
        &self.objects
    }
}

impl RecognitionSnapshot {
    /// Whether both snapshots refer to the same installed list.
    pub fn same_list(&self, other: &RecognitionSnapshot) -> bool {
        Arc::ptr_eq(&self.objects, &other.objects)
    }
}

/// The current recognition list of one camera.
#[derive(Debug, Clone)]
pub struct RecognitionList {
    objects: Arc<[RecognizedObject]>,
}

impl Default for RecognitionList {
    fn default() -> Self {
        Self {
            objects: Arc::from(Vec::new()),
        }
    }
}

impl RecognitionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new list in place of the current one.
    ///
    /// Wire-decoded and locally injected lists both come through here.
    pub fn replace(&mut self, objects: Vec<RecognizedObject>) {
        tracing::trace!(
            previous = self.objects.len(),
            current = objects.len(),
            "recognition list replaced"
        );
        self.objects = Arc::from(objects);
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecognizedObject> {
        self.objects.get(index)
    }

    pub fn snapshot(&self) -> RecognitionSnapshot {
        RecognitionSnapshot {
            objects: Arc::clone(&self.objects),
        }
    }
}

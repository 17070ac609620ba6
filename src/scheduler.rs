//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Zirt.
//! The Zirt project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.


//! # Update-Callback Scheduler
//!
//! A FIFO of native callbacks that re-enter the guest VM once per tick, e.g.
//! to resume a fiber that is waiting on a native event.
//!
//! Each callback must leave a boolean in slot 0 before returning: `true`
//! keeps it registered for the next pass, `false` removes it immediately.
//! Nodes live in an index-stable arena linked in both directions, so removal
//! in the middle of a pass is a constant-time unlink.
//!
//! The list lock is released while a callback runs. Callbacks may register
//! more callbacks; those land at the tail and run later in the same pass.
//!
//! There is no priority, deadline or fairness: a callback that never reports
//! completion keeps `run_until_empty` spinning. The scheduler logs a warning
//! once such a callback has survived `warn_after` passes but never drops it.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::vm::{ZiForeignMethodFn, ZiGuestVm};

struct ZiCallbackNode {
    callback: ZiForeignMethodFn,
    prev: Option<usize>,
    next: Option<usize>,
    passes: u64,
    warned: bool,
}

#[derive(Default)]
struct ZiCallbackList {
    slots: Vec<Option<ZiCallbackNode>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl ZiCallbackList {
    fn push_back(&mut self, callback: ZiForeignMethodFn) -> usize {
        let node = ZiCallbackNode {
            callback,
            prev: self.tail,
            next: None,
            passes: 0,
            warned: false,
        };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                index
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail.and_then(|tail| self.slots[tail].as_mut()) {
            Some(tail) => tail.next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;
        index
    }

    fn node(&self, index: usize) -> Option<&ZiCallbackNode> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut ZiCallbackNode> {
        self.slots.get_mut(index).and_then(Option::as_mut)
    }

    fn remove(&mut self, index: usize) -> Option<ZiCallbackNode> {
        let node = self.slots.get_mut(index)?.take()?;

        match node.prev.and_then(|prev| self.slots[prev].as_mut()) {
            Some(prev) => prev.next = node.next,
            None => self.head = node.next,
        }
        match node.next.and_then(|next| self.slots[next].as_mut()) {
            Some(next) => next.prev = node.prev,
            None => self.tail = node.prev,
        }

        self.free.push(index);
        self.len -= 1;
        Some(node)
    }

    fn callbacks(&self) -> Vec<ZiForeignMethodFn> {
        let mut out = Vec::with_capacity(self.len);
        let mut cursor = self.head;
        while let Some(node) = cursor.and_then(|index| self.node(index)) {
            out.push(node.callback);
            cursor = node.next;
        }
        out
    }
}

/// Per-tick re-entry callbacks for one interpreting thread.
pub struct ZiUpdateScheduler {
    list: Mutex<ZiCallbackList>,
    warn_after: Option<u64>,
}

impl ZiUpdateScheduler {
    pub fn new() -> Self {
        Self::with_starvation_warning(None)
    }

    /// Scheduler that warns about callbacks alive for more than `warn_after`
    /// passes.
    pub fn with_starvation_warning(warn_after: Option<u64>) -> Self {
        ZiUpdateScheduler {
            list: Mutex::new(ZiCallbackList::default()),
            warn_after,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ZiCallbackList> {
        self.list.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `callback` to the tail.
    pub fn register(&self, callback: ZiForeignMethodFn) {
        let index = self.lock().push_back(callback);
        log::debug!("scheduler.register: update callback registered - slot={}", index);
    }

    pub fn len(&self) -> usize {
        self.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.lock().head.is_none()
    }

    /// Registered callbacks in FIFO order.
    pub fn callbacks(&self) -> Vec<ZiForeignMethodFn> {
        self.lock().callbacks()
    }

    /// Invoke every registered callback once, head to tail, removing those
    /// that report completion. Returns the number of invocations.
    pub fn drain_once(&self, vm: &mut dyn ZiGuestVm) -> usize {
        let mut cursor = self.lock().head;
        let mut invoked = 0;

        while let Some(index) = cursor {
            let callback = {
                let mut list = self.lock();
                let Some(node) = list.node_mut(index) else {
                    break;
                };
                node.passes += 1;
                if let Some(limit) = self.warn_after {
                    if node.passes > limit && !node.warned {
                        node.warned = true;
                        log::warn!(
                            "scheduler.callback.starving: update callback has not completed - slot={}, passes={}",
                            index,
                            node.passes
                        );
                    }
                }
                node.callback
            };

            // Callbacks are native code registered through the plugin API.
            unsafe { callback(vm.as_raw()) };
            invoked += 1;
            let keep = vm.get_slot_bool(0);

            let mut list = self.lock();
            cursor = list.node(index).and_then(|node| node.next);
            if !keep {
                list.remove(index);
            }
        }

        invoked
    }

    /// Drain until no callback remains. Returns the number of passes.
    pub fn run_until_empty(&self, vm: &mut dyn ZiGuestVm) -> u64 {
        let mut passes = 0;
        while !self.is_empty() {
            self.drain_once(vm);
            passes += 1;
        }
        log::debug!("scheduler.drained: all update callbacks completed - passes={}", passes);
        passes
    }
}

impl Default for ZiUpdateScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ZiUpdateScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZiUpdateScheduler")
            .field("len", &self.len())
            .field("warn_after", &self.warn_after)
            .finish()
    }
}

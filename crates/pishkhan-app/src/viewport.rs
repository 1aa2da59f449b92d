// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
    LargeDisplay,
}

/// Width thresholds, in the same unit as the viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub mobile_below: u32,
    pub desktop_from: u32,
    pub large_from: u32,
}

impl Breakpoints {
    /// Browser-scale defaults in pixels.
    pub const PIXELS: Self = Self {
        mobile_below: 768,
        desktop_from: 1024,
        large_from: 1536,
    };

    /// Terminal-scale defaults in character cells.
    pub const CELLS: Self = Self {
        mobile_below: 60,
        desktop_from: 100,
        large_from: 160,
    };

    /// Each threshold must sit strictly above the previous one.
    pub fn is_ordered(&self) -> bool {
        self.mobile_below < self.desktop_from && self.desktop_from < self.large_from
    }
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self::CELLS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportFacts {
    pub width: u32,
    pub height: u32,
    pub device: DeviceClass,
    pub is_desktop: bool,
    pub is_large_display: bool,
    pub is_mobile: bool,
}

impl ViewportFacts {
    pub fn classify(width: u32, height: u32, breakpoints: &Breakpoints) -> Self {
        let device = if width < breakpoints.mobile_below {
            DeviceClass::Mobile
        } else if width < breakpoints.desktop_from {
            DeviceClass::Tablet
        } else if width < breakpoints.large_from {
            DeviceClass::Desktop
        } else {
            DeviceClass::LargeDisplay
        };
        Self {
            width,
            height,
            device,
            is_desktop: matches!(device, DeviceClass::Desktop | DeviceClass::LargeDisplay),
            is_large_display: device == DeviceClass::LargeDisplay,
            is_mobile: device == DeviceClass::Mobile,
        }
    }
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    senders: BTreeMap<u64, Sender<ViewportFacts>>,
}

/// Owns the current viewport facts and fans resize updates out to scoped
/// subscriptions. Each subscription unregisters itself when dropped.
#[derive(Debug)]
pub struct ViewportClassifier {
    breakpoints: Breakpoints,
    facts: ViewportFacts,
    listeners: Rc<RefCell<Listeners>>,
}

impl ViewportClassifier {
    pub fn new(width: u32, height: u32, breakpoints: Breakpoints) -> Self {
        Self {
            breakpoints,
            facts: ViewportFacts::classify(width, height, &breakpoints),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    pub fn facts(&self) -> ViewportFacts {
        self.facts
    }

    pub fn breakpoints(&self) -> Breakpoints {
        self.breakpoints
    }

    /// Recomputes facts for a new window size and notifies every live
    /// subscription. Returns the new facts.
    pub fn resize(&mut self, width: u32, height: u32) -> ViewportFacts {
        self.facts = ViewportFacts::classify(width, height, &self.breakpoints);
        let mut listeners = self.listeners.borrow_mut();
        listeners
            .senders
            .retain(|_, sender| sender.send(self.facts).is_ok());
        tracing::debug!(
            target: "pishkhan::viewport",
            width,
            height,
            device = ?self.facts.device,
            "viewport resized"
        );
        self.facts
    }

    pub fn subscribe(&self) -> ViewportSubscription {
        let (tx, rx) = mpsc::channel();
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.senders.insert(id, tx);
        ViewportSubscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
            rx,
            current: self.facts,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.borrow().senders.len()
    }
}

/// A mounted view's handle on viewport changes.
#[derive(Debug)]
pub struct ViewportSubscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
    rx: Receiver<ViewportFacts>,
    current: ViewportFacts,
}

impl ViewportSubscription {
    /// Latest facts, folding in every resize delivered since the last call.
    /// Returns whether anything changed.
    pub fn poll(&mut self) -> (ViewportFacts, bool) {
        let mut changed = false;
        while let Ok(facts) = self.rx.try_recv() {
            changed |= facts != self.current;
            self.current = facts;
        }
        (self.current, changed)
    }

    pub fn current(&self) -> ViewportFacts {
        self.current
    }
}

impl Drop for ViewportSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().senders.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Breakpoints, DeviceClass, ViewportClassifier, ViewportFacts};

    #[test]
    fn breakpoint_order_is_strict() {
        assert!(Breakpoints::CELLS.is_ordered());
        assert!(Breakpoints::PIXELS.is_ordered());
        let flat = Breakpoints {
            mobile_below: 100,
            desktop_from: 100,
            large_from: 160,
        };
        assert!(!flat.is_ordered());
        let inverted = Breakpoints {
            mobile_below: 60,
            desktop_from: 170,
            large_from: 160,
        };
        assert!(!inverted.is_ordered());
    }

    #[test]
    fn classify_uses_breakpoints() {
        let bp = Breakpoints::PIXELS;
        assert_eq!(ViewportFacts::classify(375, 800, &bp).device, DeviceClass::Mobile);
        assert_eq!(ViewportFacts::classify(800, 800, &bp).device, DeviceClass::Tablet);

        let desktop = ViewportFacts::classify(1280, 800, &bp);
        assert!(desktop.is_desktop);
        assert!(!desktop.is_large_display);
        assert!(!desktop.is_mobile);

        let large = ViewportFacts::classify(1920, 1080, &bp);
        assert!(large.is_desktop);
        assert!(large.is_large_display);
    }

    #[test]
    fn subscription_sees_latest_resize() {
        let mut classifier = ViewportClassifier::new(120, 40, Breakpoints::CELLS);
        let mut subscription = classifier.subscribe();

        classifier.resize(50, 30);
        classifier.resize(170, 50);

        let (facts, changed) = subscription.poll();
        assert!(changed);
        assert_eq!(facts.width, 170);
        assert!(facts.is_large_display);

        let (_, changed_again) = subscription.poll();
        assert!(!changed_again);
    }

    #[test]
    fn dropping_subscription_unregisters_listener() {
        let mut classifier = ViewportClassifier::new(120, 40, Breakpoints::CELLS);
        let first = classifier.subscribe();
        let second = classifier.subscribe();
        assert_eq!(classifier.subscriber_count(), 2);

        drop(first);
        assert_eq!(classifier.subscriber_count(), 1);

        classifier.resize(80, 24);
        drop(second);
        assert_eq!(classifier.subscriber_count(), 0);
    }
}

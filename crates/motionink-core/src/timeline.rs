//! Per-object keyframes and their interpolation.

use crate::props::{PropValue, Props};

/// A property snapshot at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub time: f64,
    pub props: Props,
}

impl Keyframe {
    pub fn new(time: f64, props: Props) -> Self {
        Self { time, props }
    }

    /// Properties at `time`, between this keyframe and a later one.
    ///
    /// Keys missing from `next` keep this keyframe's value.
    pub fn interpolate(&self, time: f64, next: &Keyframe) -> Props {
        if next.time == self.time {
            return self.props.clone();
        }
        let factor = (time - self.time) / (next.time - self.time);
        self.props
            .iter()
            .map(|(key, value)| {
                let value = match next.props.get(key) {
                    Some(target) => value.lerp(factor, target),
                    None => value.clone(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

/// Keyframes kept sorted by strictly increasing time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    keyframes: Vec<Keyframe>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyframes(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn keyframe_at(&self, time: f64) -> Option<&Keyframe> {
        self.keyframes.iter().find(|kf| kf.time == time)
    }

    /// Insert in time order. An existing keyframe at `time` is overwritten and
    /// its previous props returned.
    pub fn add_keyframe(&mut self, time: f64, props: Props) -> Option<Props> {
        match self.keyframes.iter().position(|kf| kf.time >= time) {
            None => {
                self.keyframes.push(Keyframe::new(time, props));
                None
            }
            Some(pos) if self.keyframes[pos].time == time => {
                Some(std::mem::replace(&mut self.keyframes[pos].props, props))
            }
            Some(pos) => {
                self.keyframes.insert(pos, Keyframe::new(time, props));
                None
            }
        }
    }

    /// Remove the keyframe at exactly `time`, returning its props.
    pub fn remove_keyframe(&mut self, time: f64) -> Option<Props> {
        let pos = self.keyframes.iter().position(|kf| kf.time == time)?;
        Some(self.keyframes.remove(pos).props)
    }

    /// Evaluate at `time`, clamping outside the keyed range.
    ///
    /// `None` when there are no keyframes at all.
    pub fn props_at(&self, time: f64) -> Option<Props> {
        let last = self.keyframes.last()?;
        let Some(pos) = self.keyframes.iter().position(|kf| kf.time >= time) else {
            return Some(last.props.clone());
        };
        let next = &self.keyframes[pos];
        if pos == 0 || next.time == time {
            return Some(next.props.clone());
        }
        Some(self.keyframes[pos - 1].interpolate(time, next))
    }

    /// Value of one property at `time`, if any keyframe carries it.
    pub fn value_at(&self, time: f64, key: &str) -> Option<PropValue> {
        self.props_at(time).and_then(|mut props| props.remove(key))
    }
}

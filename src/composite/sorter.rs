use crate::{build::layer_builder::BuiltLayer, model::layer::LayeringOrder};

/// Anything that carries a stacking tier.
pub trait Layered {
    fn layering_order(&self) -> LayeringOrder;
}

impl Layered for BuiltLayer {
    fn layering_order(&self) -> LayeringOrder {
        self.layering_order
    }
}

/// Groups layers by stacking tier for compositing.
#[derive(Clone, Copy, Debug, Default)]
pub struct LayeringSorter;

impl LayeringSorter {
    /// Tier 1 first, then tier 2, then tier 3. Layers within a tier keep their submitted order.
    pub fn sort<T: Layered>(mut layers: Vec<T>) -> Vec<T> {
        if layers.len() < 2 {
            return layers;
        }
        // `sort_by_key` is stable.
        layers.sort_by_key(|l| l.layering_order());
        layers
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/sorter.rs"]
mod tests;

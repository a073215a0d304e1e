//! Numbered algorithm registry.

use std::collections::HashMap;

use bridge_core::TradingEnvironment;

use crate::api::{ExpertAdvisor, ExpertAdvisorFactory, Indicator, IndicatorFactory};

type AdvisorConstructor =
    Box<dyn Fn(&TradingEnvironment) -> Box<dyn ExpertAdvisor> + Send + Sync>;
type IndicatorConstructor = Box<dyn Fn() -> Box<dyn Indicator> + Send + Sync>;

/// Maps the algorithm numbers terminals select to constructors.
///
/// Every session gets a fresh instance, so algorithms keep per-connection
/// state without synchronization.
#[derive(Default)]
pub struct AlgorithmRegistry {
    advisors: HashMap<i32, AdvisorConstructor>,
    indicators: HashMap<i32, IndicatorConstructor>,
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_expert_advisor<F>(&mut self, number: i32, constructor: F) -> &mut Self
    where
        F: Fn(&TradingEnvironment) -> Box<dyn ExpertAdvisor> + Send + Sync + 'static,
    {
        self.advisors.insert(number, Box::new(constructor));
        self
    }

    pub fn register_indicator<F>(&mut self, number: i32, constructor: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Indicator> + Send + Sync + 'static,
    {
        self.indicators.insert(number, Box::new(constructor));
        self
    }

    pub fn expert_advisor_numbers(&self) -> Vec<i32> {
        let mut numbers: Vec<i32> = self.advisors.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }

    pub fn indicator_numbers(&self) -> Vec<i32> {
        let mut numbers: Vec<i32> = self.indicators.keys().copied().collect();
        numbers.sort_unstable();
        numbers
    }
}

impl ExpertAdvisorFactory for AlgorithmRegistry {
    fn expert_advisor(
        &self,
        number: i32,
        environment: &TradingEnvironment,
    ) -> Option<Box<dyn ExpertAdvisor>> {
        self.advisors.get(&number).map(|build| build(environment))
    }
}

impl IndicatorFactory for AlgorithmRegistry {
    fn indicator(&self, number: i32) -> Option<Box<dyn Indicator>> {
        self.indicators.get(&number).map(|build| build())
    }
}

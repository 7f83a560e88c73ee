//! Aggregate functions
//!
//! Every aggregate here keeps its partial result as a plain [`Value`](crate::model::Value)
//! and combines partial results associatively and commutatively, so records
//! can be folded in any order or in independent partitions.

mod avg;
mod count;
mod min_max;
mod set;
mod sum;

pub use avg::AvgFunction;
pub use count::CountFunction;
pub use min_max::{MaxFunction, MinFunction};
pub use set::SetFunction;
pub use sum::SumFunction;

use crate::registry::function::FunctionRegistry;

/// Register all aggregate functions
pub fn register_aggregate_functions(registry: &mut FunctionRegistry) {
    registry.register_aggregate(AvgFunction);
    registry.register_aggregate(CountFunction);
    registry.register_aggregate(MaxFunction);
    registry.register_aggregate(MinFunction);
    registry.register_aggregate(SetFunction);
    registry.register_aggregate(SumFunction);
}

#[cfg(test)]
pub(crate) mod laws {
    use crate::model::Value;
    use crate::registry::function::AggregateFunction;

    /// Assert `combine` is associative and commutative over the given seeds
    pub(crate) fn assert_combine_laws(function: &dyn AggregateFunction, inputs: &[Vec<Value>]) {
        let seeds: Vec<Value> = inputs
            .iter()
            .map(|args| function.seed(args).unwrap())
            .collect();

        for a in &seeds {
            for b in &seeds {
                assert_eq!(
                    function.combine(a, b).unwrap(),
                    function.combine(b, a).unwrap(),
                    "{} not commutative for {a} and {b}",
                    function.name()
                );
                for c in &seeds {
                    let left = function
                        .combine(&function.combine(a, b).unwrap(), c)
                        .unwrap();
                    let right = function
                        .combine(a, &function.combine(b, c).unwrap())
                        .unwrap();
                    assert_eq!(
                        left,
                        right,
                        "{} not associative for {a}, {b}, {c}",
                        function.name()
                    );
                }
            }
        }
    }
}

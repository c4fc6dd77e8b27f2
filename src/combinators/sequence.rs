//! Sequential execution of producers
//!
//! Runs producers strictly one at a time, left to right, collecting their
//! fulfilled values. The chain is built by folding each producer onto the
//! previous link, so a producer is not even invoked until its predecessor
//! has fulfilled.

use super::Producer;
use crate::deferred::{ChainResult, Deferred};
use crate::value::Val;

/// Run producers in order, fulfilling with the list of their values
///
/// The first failure, synchronous or deferred, rejects the aggregate with
/// that reason; later producers are never invoked (rejection passes through
/// the remaining links untouched). An empty input fulfills with an empty
/// list.
pub fn in_sequence(producers: Vec<Producer>) -> Deferred {
    let seed = Deferred::fulfilled(Val::List(Vec::new()));
    producers.into_iter().fold(seed, |chain, mut producer| {
        chain.then(
            Some(Box::new(move |acc| {
                let dv = match producer() {
                    Ok(dv) => dv,
                    Err(reason) => return ChainResult::Throw(reason),
                };
                ChainResult::Chain(dv.then(
                    Some(Box::new(move |value| {
                        let Val::List(mut items) = acc else {
                            unreachable!("sequence accumulator is always a list");
                        };
                        items.push(value);
                        ChainResult::Value(Val::List(items))
                    })),
                    None,
                ))
            })),
            None,
        )
    })
}

//! Tree accumulators and propagators.
//!
//! An accumulator is a reusable stateful reducer over a sequence of
//! same-shape payloads; the sweep functions of this module apply one over
//! the children or the ancestors of every tree node in a single linear
//! pass. All sweeps operate elementwise on the trailing payload dimensions
//! of their input: a weight array of shape `(n, d1, d2, ...)` produces an
//! output of shape `(m, d1, d2, ...)`.

use crate::error::{Error, Result};
use crate::tree::{Inclusion, Tree};
use ndarray::{Array1, ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use num_traits::{Bounded, NumCast, One, Zero};

/// Numeric requirements shared by all accumulator kinds.
pub trait AccValue: Copy + PartialOrd + Zero + One + Bounded + NumCast + 'static {}

impl<T> AccValue for T where T: Copy + PartialOrd + Zero + One + Bounded + NumCast + 'static {}

/// The accumulator kinds understood by the sweep functions.
///
/// Identities: `Sum` is zero, `Prod` is one, `Min` is the value-type
/// maximum, `Max` the value-type minimum and `Counter` is zero. `Mean` has
/// no identity and fails loudly when its result is requested before any
/// accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accumulator {
    Sum,
    Prod,
    Min,
    Max,
    Mean,
    Counter,
}

/// The running state of one [`Accumulator`] over a fixed payload shape.
#[derive(Debug)]
pub struct AccumulatorState<T> {
    kind: Accumulator,
    buffer: ArrayD<T>,
    count: usize,
}

impl<T: AccValue> AccumulatorState<T> {
    /// Create a reset accumulator for the given payload shape (the shape of
    /// one accumulated element, i.e. the input shape without its first
    /// axis).
    pub fn new(kind: Accumulator, payload_shape: &[usize]) -> Self {
        let mut state = AccumulatorState {
            kind,
            buffer: ArrayD::from_elem(IxDyn(payload_shape), T::zero()),
            count: 0,
        };
        state.reset();
        state
    }

    /// Forget all accumulated values.
    pub fn reset(&mut self) {
        self.count = 0;
        let identity = match self.kind {
            Accumulator::Sum | Accumulator::Mean | Accumulator::Counter => T::zero(),
            Accumulator::Prod => T::one(),
            Accumulator::Min => T::max_value(),
            Accumulator::Max => T::min_value(),
        };
        self.buffer.fill(identity);
    }

    /// Fold one payload into the state.
    pub fn accumulate(&mut self, value: ArrayViewD<'_, T>) {
        debug_assert_eq!(value.shape(), self.buffer.shape());
        self.count += 1;
        match self.kind {
            Accumulator::Sum | Accumulator::Mean => {
                Zip::from(&mut self.buffer).and(&value).for_each(|a, &v| *a = *a + v);
            }
            Accumulator::Prod => {
                Zip::from(&mut self.buffer).and(&value).for_each(|a, &v| *a = *a * v);
            }
            Accumulator::Min => {
                Zip::from(&mut self.buffer).and(&value).for_each(|a, &v| {
                    if v < *a {
                        *a = v;
                    }
                });
            }
            Accumulator::Max => {
                Zip::from(&mut self.buffer).and(&value).for_each(|a, &v| {
                    if v > *a {
                        *a = v;
                    }
                });
            }
            Accumulator::Counter => {}
        }
    }

    /// The reduced value.
    ///
    /// **Panics** if the kind is [`Accumulator::Mean`] and nothing was
    /// accumulated since the last reset: the mean of an empty sequence is
    /// undefined.
    pub fn result(&self) -> ArrayD<T> {
        match self.kind {
            Accumulator::Mean => {
                assert!(self.count > 0, "mean accumulator queried before any accumulation");
                let count = self.count as f64;
                self.buffer.mapv(|x| {
                    let sum: f64 = NumCast::from(x).expect("accumulated value representable as f64");
                    NumCast::from(sum / count).expect("mean representable in the value type")
                })
            }
            Accumulator::Counter => {
                let count = NumCast::from(self.count).expect("count representable in the value type");
                ArrayD::from_elem(self.buffer.raw_dim(), count)
            }
            _ => self.buffer.clone(),
        }
    }
}

fn output_shape(first_axis: usize, input_shape: &[usize]) -> Vec<usize> {
    let mut shape = Vec::with_capacity(input_shape.len());
    shape.push(first_axis);
    shape.extend_from_slice(&input_shape[1..]);
    shape
}

fn check_first_axis(shape: &[usize], expected: usize, what: &str) -> Result<()> {
    if shape.is_empty() || shape[0] != expected {
        return Err(Error::invalid(format!(
            "{what} weighting must have a first dimension of {expected}, got shape {shape:?}"
        )));
    }
    Ok(())
}

/// For every internal node, reduce the input values of its *children*; the
/// result at a leaf is the accumulator identity.
///
/// `input` is a node weighting of the tree.
pub fn accumulate_parallel<T: AccValue>(
    tree: &Tree,
    input: ArrayViewD<'_, T>,
    acc: Accumulator,
) -> Result<ArrayD<T>> {
    check_first_axis(input.shape(), tree.num_vertices(), "node")?;
    let mut state = AccumulatorState::new(acc, &input.shape()[1..]);
    let mut output = ArrayD::from_elem(IxDyn(input.shape()), T::zero());

    let identity = state.result();
    for i in tree.leaves_iterator() {
        output.index_axis_mut(Axis(0), i).assign(&identity);
    }

    for i in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        state.reset();
        for &c in tree.children(i) {
            state.accumulate(input.index_axis(Axis(0), c));
        }
        output.index_axis_mut(Axis(0), i).assign(&state.result());
    }
    Ok(output)
}

/// The canonical bottom-up sweep: leaves are copied from `leaf_input`,
/// every internal node reduces the already-computed results of its
/// children.
pub fn accumulate_sequential<T: AccValue>(
    tree: &Tree,
    leaf_input: ArrayViewD<'_, T>,
    acc: Accumulator,
) -> Result<ArrayD<T>> {
    check_first_axis(leaf_input.shape(), tree.num_leaves(), "leaf")?;
    let shape = output_shape(tree.num_vertices(), leaf_input.shape());
    let mut state = AccumulatorState::new(acc, &leaf_input.shape()[1..]);
    let mut output = ArrayD::from_elem(IxDyn(&shape), T::zero());

    for i in tree.leaves_iterator() {
        output
            .index_axis_mut(Axis(0), i)
            .assign(&leaf_input.index_axis(Axis(0), i));
    }

    for i in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        state.reset();
        for &c in tree.children(i) {
            state.accumulate(output.index_axis(Axis(0), c));
        }
        let reduced = state.result();
        output.index_axis_mut(Axis(0), i).assign(&reduced);
    }
    Ok(output)
}

/// Bottom-up sweep combining the children reduction with a per-node input:
/// leaves are copied from `leaf_input` and an internal node `n` gets
/// `combine(acc(children results), input[n])`, elementwise.
pub fn accumulate_and_combine_sequential<T, F>(
    tree: &Tree,
    input: ArrayViewD<'_, T>,
    leaf_input: ArrayViewD<'_, T>,
    acc: Accumulator,
    combine: F,
) -> Result<ArrayD<T>>
where
    T: AccValue,
    F: Fn(T, T) -> T,
{
    check_first_axis(input.shape(), tree.num_vertices(), "node")?;
    check_first_axis(leaf_input.shape(), tree.num_leaves(), "leaf")?;
    if input.shape()[1..] != leaf_input.shape()[1..] {
        return Err(Error::invalid("node and leaf inputs must share their payload shape"));
    }
    let shape = output_shape(tree.num_vertices(), leaf_input.shape());
    let mut state = AccumulatorState::new(acc, &leaf_input.shape()[1..]);
    let mut output = ArrayD::from_elem(IxDyn(&shape), T::zero());

    for i in tree.leaves_iterator() {
        output
            .index_axis_mut(Axis(0), i)
            .assign(&leaf_input.index_axis(Axis(0), i));
    }

    for i in tree.leaves_to_root_iterator(Inclusion::Exclude, Inclusion::Include) {
        state.reset();
        for &c in tree.children(i) {
            state.accumulate(output.index_axis(Axis(0), c));
        }
        let reduced = state.result();
        let node_input = input.index_axis(Axis(0), i);
        Zip::from(output.index_axis_mut(Axis(0), i))
            .and(&reduced)
            .and(&node_input)
            .for_each(|o, &r, &v| *o = combine(r, v));
    }
    Ok(output)
}

/// Copy to every node the input value of its parent.
///
/// Without a condition, `output[n] = input[parent(n)]` for every non-root
/// node and the root keeps its own value. With a condition,
/// `output[n] = input[parent(n)]` where `condition[n]` holds and
/// `output[n] = input[n]` elsewhere.
pub fn propagate_parallel<T: Clone>(
    tree: &Tree,
    input: ArrayViewD<'_, T>,
    condition: Option<&Array1<bool>>,
) -> Result<ArrayD<T>> {
    check_first_axis(input.shape(), tree.num_vertices(), "node")?;
    if let Some(condition) = condition {
        if condition.len() != tree.num_vertices() {
            return Err(Error::invalid("condition must be a node weighting of the tree"));
        }
    }
    let mut output = input.to_owned();
    for n in tree.leaves_to_root_iterator(Inclusion::Include, Inclusion::Include) {
        let take_parent = condition.map_or(true, |c| c[n]);
        if take_parent {
            output
                .index_axis_mut(Axis(0), n)
                .assign(&input.index_axis(Axis(0), tree.parent(n)));
        }
    }
    Ok(output)
}

/// Top-down transitive propagation along condition-enabled edges:
/// `output[root] = input[root]` and, scanning from the root down,
/// `output[n] = output[parent(n)]` where `condition[n]` holds and
/// `output[n] = input[n]` elsewhere.
pub fn propagate_sequential<T: Clone>(
    tree: &Tree,
    input: ArrayViewD<'_, T>,
    condition: &Array1<bool>,
) -> Result<ArrayD<T>> {
    check_first_axis(input.shape(), tree.num_vertices(), "node")?;
    if condition.len() != tree.num_vertices() {
        return Err(Error::invalid("condition must be a node weighting of the tree"));
    }
    let mut output = input.to_owned();
    for n in tree.root_to_leaves_iterator(Inclusion::Include, Inclusion::Exclude) {
        if condition[n] {
            let parent_value = output.index_axis(Axis(0), tree.parent(n)).to_owned();
            output.index_axis_mut(Axis(0), n).assign(&parent_value);
        }
    }
    Ok(output)
}

/// Top-down reduction of every node's root path:
/// `output[root] = input[root]` and
/// `output[n] = acc(output[parent(n)], input[n])` elementwise.
pub fn propagate_sequential_and_accumulate<T: AccValue>(
    tree: &Tree,
    input: ArrayViewD<'_, T>,
    acc: Accumulator,
) -> Result<ArrayD<T>> {
    check_first_axis(input.shape(), tree.num_vertices(), "node")?;
    let mut state = AccumulatorState::new(acc, &input.shape()[1..]);
    let mut output = input.to_owned();
    for n in tree.root_to_leaves_iterator(Inclusion::Include, Inclusion::Exclude) {
        state.reset();
        state.accumulate(output.index_axis(Axis(0), tree.parent(n)));
        state.accumulate(input.index_axis(Axis(0), n));
        let reduced = state.result();
        output.index_axis_mut(Axis(0), n).assign(&reduced);
    }
    Ok(output)
}

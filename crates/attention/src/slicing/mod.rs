//! Segment slicing over concatenated two-segment sequences.
//!
//! A sentence-pair input is one sequence of `total_len` positions split at a
//! [`SegmentBoundary`]: positions `[0, b)` belong to segment A and
//! `[b, total_len)` to segment B. Attention tensors are cut on their last two
//! axes into the four directional blocks, query/key tensors on their position
//! axis only.
//!
//! All cuts are `Tensor::narrow` views over the source storage; nothing is
//! copied or written back. Blocks are *not* renormalised: a row of `ab`
//! holds the share of a full-row distribution that falls on segment B, so it
//! generally does not sum to one. Only the unsliced tensor keeps the
//! per-row distribution property, and [`Directional::reassemble`] restores it
//! exactly.

use std::ops::Range;

use candle_core::Tensor;

use crate::core::{AttentionError, Result};

/// One side of a segmented sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    A,
    B,
}

/// Offset into a concatenated sequence at which segment B begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentBoundary {
    offset: usize,
    total_len: usize,
}

impl SegmentBoundary {
    /// Both segments must be non-empty: `offset` lies in `[1, total_len - 1]`.
    pub fn new(offset: usize, total_len: usize) -> Result<Self> {
        if offset == 0 || offset >= total_len {
            return Err(AttentionError::unsupported(format!(
                "segment boundary {offset} outside [1, {}] for a sequence of {total_len} tokens",
                total_len.saturating_sub(1)
            )));
        }
        Ok(Self { offset, total_len })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Position range covered by `segment`.
    pub fn range(&self, segment: Segment) -> Range<usize> {
        match segment {
            Segment::A => 0..self.offset,
            Segment::B => self.offset..self.total_len,
        }
    }
}

/// A value per segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Segments<T> {
    pub a: T,
    pub b: T,
}

impl<T> Segments<T> {
    pub fn get(&self, segment: Segment) -> &T {
        match segment {
            Segment::A => &self.a,
            Segment::B => &self.b,
        }
    }
}

/// A value per directional block, `xy` meaning queries from X attending to
/// keys from Y.
#[derive(Debug, Clone, PartialEq)]
pub struct Directional<T> {
    pub aa: T,
    pub ab: T,
    pub ba: T,
    pub bb: T,
}

impl<T> Directional<T> {
    /// Blocks in `aa`, `ab`, `ba`, `bb` order.
    pub fn into_array(self) -> [T; 4] {
        [self.aa, self.ab, self.ba, self.bb]
    }
}

impl Directional<Tensor> {
    /// Stack `aa | ab` above `ba | bb` on the last two axes, recovering the
    /// tensor the blocks were cut from.
    pub fn reassemble(&self) -> Result<Tensor> {
        let rank = self.aa.rank();
        if rank < 2 {
            return Err(AttentionError::unsupported(format!(
                "cannot reassemble blocks of shape {:?}",
                self.aa.dims()
            )));
        }
        let top = Tensor::cat(&[&self.aa, &self.ab], rank - 1)?;
        let bottom = Tensor::cat(&[&self.ba, &self.bb], rank - 1)?;
        Ok(Tensor::cat(&[&top, &bottom], rank - 2)?)
    }
}

/// Cuts tensors and token lists of one sequence at an optional boundary.
#[derive(Debug, Clone, Copy)]
pub struct SegmentSlicer {
    total_len: usize,
    boundary: Option<SegmentBoundary>,
}

impl SegmentSlicer {
    /// Slicer for a sequence of `total_len` positions; `sentence_b_start`
    /// of `None` means single-sequence mode.
    pub fn new(total_len: usize, sentence_b_start: Option<usize>) -> Result<Self> {
        let boundary = sentence_b_start
            .map(|offset| SegmentBoundary::new(offset, total_len))
            .transpose()?;
        Ok(Self {
            total_len,
            boundary,
        })
    }

    pub fn is_segmented(&self) -> bool {
        self.boundary.is_some()
    }

    /// Cut `[.., total_len, total_len]` attention into its four directional
    /// blocks. Returns `None` in single-sequence mode.
    pub fn slice_attention(&self, attn: &Tensor) -> Result<Option<Directional<Tensor>>> {
        let Some(boundary) = self.boundary else {
            return Ok(None);
        };
        let (row_axis, col_axis) = self.position_axes(attn, true)?;
        let a = boundary.range(Segment::A);
        let b = boundary.range(Segment::B);

        let block = |rows: &Range<usize>, cols: &Range<usize>| -> Result<Tensor> {
            Ok(attn
                .narrow(row_axis, rows.start, rows.len())?
                .narrow(col_axis, cols.start, cols.len())?)
        };

        Ok(Some(Directional {
            aa: block(&a, &a)?,
            ab: block(&a, &b)?,
            ba: block(&b, &a)?,
            bb: block(&b, &b)?,
        }))
    }

    /// Cut a `[.., total_len, feature]` query/key tensor on its position axis.
    /// Returns `None` in single-sequence mode.
    pub fn slice_positions(&self, vectors: &Tensor) -> Result<Option<Segments<Tensor>>> {
        let Some(boundary) = self.boundary else {
            return Ok(None);
        };
        let (row_axis, _) = self.position_axes(vectors, false)?;
        let cut = |segment: Segment| -> Result<Tensor> {
            let range = boundary.range(segment);
            Ok(vectors.narrow(row_axis, range.start, range.len())?)
        };
        Ok(Some(Segments {
            a: cut(Segment::A)?,
            b: cut(Segment::B)?,
        }))
    }

    /// Split a token list at the boundary. Returns `None` in single-sequence
    /// mode or when the list does not cover the sequence.
    pub fn slice_tokens<'t>(&self, tokens: &'t [String]) -> Option<Segments<&'t [String]>> {
        let boundary = self.boundary?;
        if tokens.len() != self.total_len {
            return None;
        }
        let (a, b) = tokens.split_at(boundary.offset());
        Some(Segments { a, b })
    }

    fn position_axes(&self, tensor: &Tensor, square: bool) -> Result<(usize, usize)> {
        let dims = tensor.dims();
        let rank = dims.len();
        let covers = rank >= 2
            && dims[rank - 2] == self.total_len
            && (!square || dims[rank - 1] == self.total_len);
        if !covers {
            return Err(AttentionError::unsupported(format!(
                "tensor of shape {dims:?} does not cover a sequence of {} positions",
                self.total_len
            )));
        }
        Ok((rank - 2, rank - 1))
    }
}

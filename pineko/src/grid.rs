//! Module containing the grid container.

use super::bin::{BinInfo, BinLimits, BinRemapper};
use super::boc::{Channel, Order};
use super::empty_subgrid::EmptySubgridV1;
use super::error::{Error, Result};
use super::subgrid::{self, Subgrid, SubgridEnum};
use git_version::git_version;
use lz4_flex::frame::{FrameDecoder, FrameEncoder};
use ndarray::{Array3, ArrayView3, ArrayViewMut3, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::{iter, mem};

const MAGIC: &[u8; 8] = b"PinekoGr";
const FILE_VERSION: u64 = 1;

/// This structure captures the information needed to create an evolution kernel operator (EKO) for
/// a specific [`Grid`].
#[derive(Debug, Default, PartialEq)]
pub struct EvolveInfo {
    /// Squared factorization scales of the `Grid`.
    pub fac1: Vec<f64>,
    /// Particle identifiers of the `Grid`.
    pub pids1: Vec<i32>,
    /// `x`-grid coordinates of the `Grid`.
    pub x1: Vec<f64>,
    /// Squared renormalization scales of the `Grid`.
    pub ren1: Vec<f64>,
}

/// Main data structure of this crate. This structure contains a `Subgrid` for each order, bin and
/// channel.
#[derive(Clone, Deserialize, Serialize)]
pub struct Grid {
    subgrids: Array3<SubgridEnum>,
    orders: Vec<Order>,
    channels: Vec<Channel>,
    bin_limits: BinLimits,
    remapper: Option<BinRemapper>,
    key_values: BTreeMap<String, String>,
}

impl Grid {
    /// Constructor. All subgrids are empty.
    #[must_use]
    pub fn new(channels: Vec<Channel>, orders: Vec<Order>, bin_limits: BinLimits) -> Self {
        Self {
            subgrids: Array3::from_shape_simple_fn(
                (orders.len(), bin_limits.bins(), channels.len()),
                || EmptySubgridV1.into(),
            ),
            orders,
            channels,
            bin_limits,
            remapper: None,
            key_values: iter::once((
                "pineko_gitversion".to_owned(),
                git_version!(
                    args = ["--always", "--dirty", "--long", "--tags"],
                    cargo_prefix = "cargo:",
                    fallback = "unknown"
                )
                .to_owned(),
            ))
            .collect(),
        }
    }

    /// Construct a `Grid` by deserializing it from `reader`. Reading is buffered and LZ4
    /// compression is detected automatically.
    ///
    /// # Errors
    ///
    /// If reading from the compressed or uncompressed stream fails an error is returned.
    pub fn read(reader: impl Read) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let buffer = reader.fill_buf()?;
        let magic_bytes: [u8; 4] = buffer
            .get(0..4)
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| Error::General("file is too short to be a grid".to_owned()))?;

        if u32::from_le_bytes(magic_bytes) == 0x18_4D_22_04 {
            Self::read_uncompressed(FrameDecoder::new(reader))
        } else {
            Self::read_uncompressed(reader)
        }
    }

    fn read_uncompressed(mut reader: impl Read) -> Result<Self> {
        let mut header = [0; 16];
        reader.read_exact(&mut header)?;

        if &header[0..8] != MAGIC {
            return Err(Error::General("file is not a grid".to_owned()));
        }

        let file_version = u64::from_le_bytes(
            header[8..16]
                .try_into()
                .unwrap_or_else(|_| unreachable!()),
        );

        match file_version {
            FILE_VERSION => {
                bincode::deserialize_from(reader).map_err(|err| Error::Other(err.into()))
            }
            _ => Err(Error::General(format!(
                "file version {file_version} is not supported"
            ))),
        }
    }

    /// Serializes `self` into `writer`. Writing is buffered.
    ///
    /// # Errors
    ///
    /// If writing fails an error is returned.
    pub fn write(&self, writer: impl Write) -> Result<()> {
        let mut writer = BufWriter::new(writer);

        // first write the file header
        writer.write_all(MAGIC)?;
        writer.write_all(&FILE_VERSION.to_le_bytes())?;

        // then serialize
        bincode::serialize_into(&mut writer, self).map_err(|err| Error::Other(err.into()))?;
        writer.flush()?;

        Ok(())
    }

    /// Serializes `self` into `writer`, using LZ4 compression. Writing is buffered.
    ///
    /// # Errors
    ///
    /// If writing or compression fails an error is returned.
    pub fn write_lz4(&self, writer: impl Write) -> Result<()> {
        let mut encoder = FrameEncoder::new(writer);
        self.write(&mut encoder)?;
        encoder
            .finish()
            .map_err(|err| Error::Other(err.into()))?;

        Ok(())
    }

    /// Return the orders of this `Grid`.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Return the channels of this `Grid`.
    #[must_use]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Return all information about the bins of this `Grid`.
    #[must_use]
    pub fn bin_info(&self) -> BinInfo<'_> {
        BinInfo::new(&self.bin_limits, self.remapper.as_ref())
    }

    /// Return the one-dimensional bin limits this grid was created with.
    #[must_use]
    pub const fn bin_limits(&self) -> &BinLimits {
        &self.bin_limits
    }

    /// Return the remapper, if any was set.
    #[must_use]
    pub const fn remapper(&self) -> Option<&BinRemapper> {
        self.remapper.as_ref()
    }

    /// Set the multi-dimensional bin limits and normalizations of this grid.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of bins of `remapper` and of this grid are different.
    pub fn set_remapper(&mut self, remapper: BinRemapper) -> Result<()> {
        if remapper.bins() != self.bin_limits.bins() {
            return Err(Error::General(format!(
                "{} bins are given, but the grid has {}",
                remapper.bins(),
                self.bin_limits.bins()
            )));
        }

        self.remapper = Some(remapper);

        Ok(())
    }

    /// Return the subgrid of the given order, bin and channel.
    ///
    /// # Panics
    ///
    /// Panics if one of the indices is out of range.
    #[must_use]
    pub fn subgrid(&self, order: usize, bin: usize, channel: usize) -> &SubgridEnum {
        &self.subgrids[[order, bin, channel]]
    }

    /// Return all subgrids as an `ArrayView3`.
    #[must_use]
    pub fn subgrids(&self) -> ArrayView3<'_, SubgridEnum> {
        self.subgrids.view()
    }

    /// Return all subgrids as an `ArrayViewMut3`.
    #[must_use]
    pub fn subgrids_mut(&mut self) -> ArrayViewMut3<'_, SubgridEnum> {
        self.subgrids.view_mut()
    }

    /// Return the key-value metadata of this grid.
    #[must_use]
    pub const fn key_values(&self) -> &BTreeMap<String, String> {
        &self.key_values
    }

    /// Set the metadata `key` to `value`.
    pub fn set_key_value(&mut self, key: &str, value: &str) {
        self.key_values.insert(key.to_owned(), value.to_owned());
    }

    /// Add the non-empty subgrids of `other` to the ones of `self` with the same order, bin and
    /// channel. Every order of `other` that `self` does not know yet is appended to its order axis,
    /// even if all of its subgrids are empty. Channels are only appended if they carry a non-empty
    /// subgrid.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Incompatible`] if the bins of both grids differ or if two non-empty
    /// subgrids that must be added have different `x` nodes. In both cases `self` is unchanged.
    pub fn merge(&mut self, mut other: Self) -> Result<()> {
        if self.bin_info() != other.bin_info() {
            return Err(Error::Incompatible(
                "can not merge grids with different bins".to_owned(),
            ));
        }

        for ((order, bin, channel), subgrid) in other.subgrids.indexed_iter() {
            if subgrid.is_empty() {
                continue;
            }

            let slot = self
                .orders
                .iter()
                .position(|o| *o == other.orders[order])
                .zip(self.channels.iter().position(|c| *c == other.channels[channel]))
                .map(|(order, channel)| &self.subgrids[[order, bin, channel]]);

            if let Some(slot) = slot.filter(|slot| !slot.is_empty()) {
                if !subgrid::same_x_grids(slot, subgrid) {
                    return Err(Error::Incompatible(format!(
                        "can not merge subgrids of order {} with different x nodes",
                        other.orders[order]
                    )));
                }
            }
        }

        for order in &other.orders {
            position_or_push(&mut self.orders, order);
        }

        let mut filled = Vec::new();

        for ((order, bin, channel), subgrid) in other.subgrids.indexed_iter_mut() {
            if subgrid.is_empty() {
                continue;
            }

            let order = position_or_push(&mut self.orders, &other.orders[order]);
            let channel = position_or_push(&mut self.channels, &other.channels[channel]);
            filled.push(([order, bin, channel], mem::replace(subgrid, EmptySubgridV1.into())));
        }

        let (orders, bins, channels) = self.subgrids.dim();

        if (orders, channels) != (self.orders.len(), self.channels.len()) {
            let mut old = mem::replace(
                &mut self.subgrids,
                Array3::from_shape_simple_fn(
                    (self.orders.len(), bins, self.channels.len()),
                    || EmptySubgridV1.into(),
                ),
            );

            for (index, subgrid) in old.indexed_iter_mut() {
                mem::swap(&mut self.subgrids[<[usize; 3]>::from(index)], subgrid);
            }
        }

        for (index, subgrid) in filled {
            let slot = &mut self.subgrids[index];

            if slot.is_empty() {
                *slot = subgrid;
            } else {
                slot.merge(&subgrid);
            }
        }

        Ok(())
    }

    /// Multiply every subgrid of bin `i` with `factors[i]`. Bins without a factor are left
    /// untouched and superfluous factors are ignored.
    pub fn scale_by_bin(&mut self, factors: &[f64]) {
        for (bin, factor) in factors.iter().enumerate().take(self.bin_limits.bins()) {
            self.subgrids
                .index_axis_mut(Axis(1), bin)
                .iter_mut()
                .for_each(|subgrid| subgrid.scale(*factor));
        }
    }

    /// Remove the orders at `order_indices` together with their subgrids. Repeated and
    /// out-of-range indices are ignored.
    pub fn delete_orders(&mut self, order_indices: &[usize]) {
        let keep: Vec<_> = (0..self.orders.len())
            .filter(|index| !order_indices.contains(index))
            .collect();

        if keep.len() != self.orders.len() {
            self.subgrids = self.subgrids.select(Axis(0), &keep);
            self.orders = keep.iter().map(|&index| self.orders[index]).collect();
        }
    }

    /// Collect the nodes of all non-empty subgrids belonging to the orders selected by
    /// `order_mask`, which an evolution operator for this grid must provide. An empty mask selects
    /// every order.
    #[must_use]
    pub fn evolve_info(&self, order_mask: &[bool]) -> EvolveInfo {
        let mut info = EvolveInfo::default();

        for ((order, _, channel), subgrid) in self.subgrids.indexed_iter() {
            let selected = order_mask.is_empty() || order_mask.get(order) == Some(&true);

            if subgrid.is_empty() || !selected {
                continue;
            }

            info.ren1.extend(subgrid.mu2_grid().iter().map(|mu2| mu2.ren));
            info.fac1.extend(subgrid.mu2_grid().iter().map(|mu2| mu2.fac));
            info.x1.extend(subgrid.x1_grid().iter().chain(subgrid.x2_grid().iter()));
            info.pids1.extend(
                self.channels[channel]
                    .entry()
                    .iter()
                    .flat_map(|(pids, _)| pids.iter().copied()),
            );
        }

        for nodes in [&mut info.ren1, &mut info.fac1, &mut info.x1] {
            nodes.sort_by(f64::total_cmp);
            nodes.dedup_by(subgrid::node_value_eq_ref_mut);
        }

        info.pids1.sort_unstable();
        info.pids1.dedup();

        info
    }
}

fn position_or_push<T: Clone + PartialEq>(items: &mut Vec<T>, item: &T) -> usize {
    items.iter().position(|x| x == item).unwrap_or_else(|| {
        items.push(item.clone());
        items.len() - 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel;
    use crate::import_only_subgrid::ImportOnlySubgridV2;
    use crate::subgrid::Mu2;

    fn filled(value: f64) -> SubgridEnum {
        ImportOnlySubgridV2::new(
            Array3::from_elem((1, 2, 2), value),
            vec![Mu2 {
                ren: 100.0,
                fac: 100.0,
            }],
            vec![0.1, 1.0],
            vec![0.2, 1.0],
        )
        .into()
    }

    fn grid(orders: Vec<Order>) -> Grid {
        Grid::new(
            vec![
                channel![2, 2, 1.0; 4, 4, 1.0],
                channel![1, 1, 1.0; 3, 3, 1.0],
            ],
            orders,
            BinLimits::new(vec![0.0, 0.25, 0.5, 0.75, 1.0]),
        )
    }

    #[test]
    fn grid_read_file_version_unsupported() {
        let result = Grid::read(
            &[
                b'P', b'i', b'n', b'e', b'k', b'o', b'G', b'r', 99, 0, 0, 0, 0, 0, 0, 0,
            ][..],
        );

        assert!(
            matches!(result, Err(Error::General(msg)) if msg == "file version 99 is not supported")
        );
    }

    #[test]
    fn grid_read_too_short() {
        assert!(matches!(Grid::read(&[0_u8; 2][..]), Err(Error::General(_))));
    }

    #[test]
    fn grid_write_and_read() {
        let mut grid = grid(vec![Order::new(0, 2, 0, 0)]);
        grid.subgrids_mut()[[0, 1, 0]] = filled(3.0);
        grid.set_key_value("theory", "PTO: 0");

        let mut buffer = Vec::new();
        grid.write_lz4(&mut buffer).unwrap();
        let read = Grid::read(buffer.as_slice()).unwrap();

        assert_eq!(read.orders(), grid.orders());
        assert_eq!(read.channels(), grid.channels());
        assert_eq!(read.key_values()["theory"], "PTO: 0");
        assert!(read.subgrid(0, 0, 0).is_empty());
        assert!(!read.subgrid(0, 1, 0).is_empty());
    }

    #[test]
    fn grid_merge_empty_subgrids() {
        let mut grid0 = grid(vec![Order::new(0, 2, 0, 0)]);
        let other = grid(vec![Order::new(1, 2, 0, 0), Order::new(1, 2, 1, 0)]);

        // orders without content are still added
        grid0.merge(other).unwrap();

        assert_eq!(grid0.bin_info().bins(), 4);
        assert_eq!(grid0.channels().len(), 2);
        assert_eq!(
            grid0.orders(),
            [
                Order::new(0, 2, 0, 0),
                Order::new(1, 2, 0, 0),
                Order::new(1, 2, 1, 0)
            ]
        );
        assert_eq!(grid0.subgrids().dim(), (3, 4, 2));
        assert!(grid0.subgrids().iter().all(Subgrid::is_empty));
    }

    #[test]
    fn grid_merge_orders() {
        let mut grid0 = grid(vec![Order::new(0, 2, 0, 0)]);
        grid0.subgrids_mut()[[0, 0, 0]] = filled(1.0);

        let mut other = grid(vec![
            Order::new(1, 2, 0, 0),
            Order::new(1, 2, 1, 0),
            Order::new(0, 2, 0, 0),
        ]);
        other.subgrids_mut()[[0, 0, 0]] = filled(1.0);
        other.subgrids_mut()[[1, 0, 1]] = filled(2.0);
        other.subgrids_mut()[[2, 0, 0]] = filled(0.5);

        grid0.merge(other).unwrap();

        assert_eq!(grid0.bin_info().bins(), 4);
        assert_eq!(grid0.channels().len(), 2);
        assert_eq!(
            grid0.orders(),
            [
                Order::new(0, 2, 0, 0),
                Order::new(1, 2, 0, 0),
                Order::new(1, 2, 1, 0)
            ]
        );

        let SubgridEnum::ImportOnlySubgridV2(lo) = grid0.subgrid(0, 0, 0) else {
            panic!("unexpected subgrid type");
        };
        assert!(lo.array().iter().all(|&value| value == 1.5));
    }

    #[test]
    fn grid_merge_channels() {
        let mut grid0 = grid(vec![Order::new(0, 2, 0, 0)]);
        let mut other = Grid::new(
            vec![channel![21, 21, 1.0]],
            vec![Order::new(0, 2, 0, 0)],
            BinLimits::new(vec![0.0, 0.25, 0.5, 0.75, 1.0]),
        );
        other.subgrids_mut()[[0, 3, 0]] = filled(1.0);

        grid0.merge(other).unwrap();

        assert_eq!(grid0.channels().len(), 3);
        assert!(!grid0.subgrid(0, 3, 2).is_empty());
    }

    #[test]
    fn grid_merge_different_bins() {
        let mut grid0 = grid(vec![Order::new(0, 2, 0, 0)]);
        let other = Grid::new(
            vec![channel![21, 21, 1.0]],
            vec![Order::new(0, 2, 0, 0)],
            BinLimits::new(vec![0.0, 1.0]),
        );

        assert!(matches!(grid0.merge(other), Err(Error::Incompatible(_))));
    }

    #[test]
    fn grid_merge_different_x_nodes() {
        let mut grid0 = grid(vec![Order::new(0, 2, 0, 0)]);
        grid0.subgrids_mut()[[0, 1, 0]] = filled(1.0);

        let mut other = grid(vec![Order::new(0, 2, 0, 0), Order::new(1, 2, 0, 0)]);
        other.subgrids_mut()[[1, 0, 0]] = filled(1.0);
        other.subgrids_mut()[[0, 1, 0]] = ImportOnlySubgridV2::new(
            Array3::from_elem((1, 2, 2), 1.0),
            vec![Mu2 {
                ren: 100.0,
                fac: 100.0,
            }],
            vec![0.3, 1.0],
            vec![0.2, 1.0],
        )
        .into();

        assert!(matches!(grid0.merge(other), Err(Error::Incompatible(_))));
        assert_eq!(grid0.orders(), [Order::new(0, 2, 0, 0)]);
        assert_eq!(grid0.subgrids().dim(), (1, 4, 2));
    }

    #[test]
    fn grid_delete_orders() {
        let mut grid = grid(vec![
            Order::new(0, 2, 0, 0),
            Order::new(1, 2, 0, 0),
            Order::new(1, 2, 1, 0),
        ]);

        grid.delete_orders(&[1, 1, 7]);

        assert_eq!(
            grid.orders(),
            [Order::new(0, 2, 0, 0), Order::new(1, 2, 1, 0)]
        );
        assert_eq!(grid.subgrids().dim(), (2, 4, 2));
    }

    #[test]
    fn grid_set_remapper() {
        let mut grid = grid(vec![Order::new(0, 2, 0, 0)]);

        assert!(grid.set_remapper(BinRemapper::new(vec![1.0], vec![(0.0, 1.0)]).unwrap()).is_err());

        grid.set_remapper(
            BinRemapper::new(
                vec![1.0; 4],
                vec![(1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0)],
            )
            .unwrap(),
        )
        .unwrap();

        assert_eq!(grid.bin_info().left(0), [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(grid.bin_info().normalizations(), [1.0; 4]);
    }

    #[test]
    fn grid_evolve_info() {
        let mut grid = grid(vec![Order::new(0, 2, 0, 0), Order::new(1, 2, 0, 0)]);
        grid.subgrids_mut()[[0, 0, 0]] = filled(1.0);
        grid.subgrids_mut()[[1, 0, 1]] = ImportOnlySubgridV2::new(
            Array3::from_elem((1, 1, 1), 1.0),
            vec![Mu2 {
                ren: 400.0,
                fac: 200.0,
            }],
            vec![0.5],
            vec![0.5],
        )
        .into();

        let info = grid.evolve_info(&[]);

        assert_eq!(info.fac1, [100.0, 200.0]);
        assert_eq!(info.ren1, [100.0, 400.0]);
        assert_eq!(info.x1, [0.1, 0.2, 0.5, 1.0]);
        assert_eq!(info.pids1, [1, 2, 3, 4]);

        let info = grid.evolve_info(&[true, false]);

        assert_eq!(info.fac1, [100.0]);
        assert_eq!(info.pids1, [2, 4]);
    }
}

use std::sync::Arc;

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::TensorData};

use crate::datasets::{InferenceItem, LoadedItem};
use crate::error::DatasetError;

/// Stacks preprocessed items into batches for a burn `DataLoader`.
#[derive(Clone, Debug, Default)]
pub struct InferenceBatcher {}

#[derive(Clone, Debug)]
pub struct InferenceBatch<B: Backend> {
    /// Shape: `[N, 3, H, W]`, values in `[0, 1]`.
    pub images: Tensor<B, 4>,
    /// Dataset index of every image in the batch. Shape: `[N]`.
    pub indices: Tensor<B, 1, Int>,
}

/// A batch built from [`LoadedItem`]s: the first item that failed to load
/// turns the whole batch into that error.
pub type LoadedBatch<B> = std::result::Result<InferenceBatch<B>, Arc<DatasetError>>;

impl InferenceBatcher {
    pub fn new() -> Self {
        Self {}
    }
}

impl<B: Backend> Batcher<B, InferenceItem, InferenceBatch<B>> for InferenceBatcher {
    fn batch(&self, items: Vec<InferenceItem>, device: &B::Device) -> InferenceBatch<B> {
        let images = items
            .iter()
            .map(|item| {
                Tensor::<B, 3>::from_data(item.image.clone().convert::<B::FloatElem>(), device)
            })
            .collect::<Vec<_>>();
        let images = Tensor::stack(images, 0);

        let indices: Vec<i64> = items.iter().map(|item| item.idx as i64).collect();
        let indices = Tensor::<B, 1, Int>::from_data(
            TensorData::new(indices, [items.len()]).convert::<B::IntElem>(),
            device,
        );

        InferenceBatch { images, indices }
    }
}

impl<B: Backend> Batcher<B, LoadedItem, LoadedBatch<B>> for InferenceBatcher {
    fn batch(&self, items: Vec<LoadedItem>, device: &B::Device) -> LoadedBatch<B> {
        let items = items.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(<Self as Batcher<B, InferenceItem, InferenceBatch<B>>>::batch(self, items, device))
    }
}

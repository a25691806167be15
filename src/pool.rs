use burn::{
    prelude::*,
    tensor::module::{interpolate, max_pool2d},
    tensor::ops::{InterpolateMode, InterpolateOptions},
};

use crate::error::{Result, SegNetError};

const WINDOW: [usize; 2] = [2, 2];

/// 2x2, stride 2 max-pool that also returns where each maximum came from.
///
/// Indices are flat offsets `h * W + w` into the `H x W` plane of the input,
/// one per pooled cell; ties go to the first position in row-major order.
/// Odd trailing rows and columns are dropped.
pub fn max_pool<B: Backend>(input: Tensor<B, 4>) -> (Tensor<B, 4>, Tensor<B, 4, Int>) {
    let [batch, channels, height, width] = input.dims();
    let (h, w) = (height / 2, width / 2);
    let device = input.device();

    let x = input.slice([0..batch, 0..channels, 0..h * 2, 0..w * 2]);
    let pooled = max_pool2d(x.clone(), WINDOW, WINDOW, [0, 0], [1, 1]);

    // window maximum broadcast back over its 2x2 cells
    let spread = interpolate(
        pooled.clone(),
        [h * 2, w * 2],
        InterpolateOptions::new(InterpolateMode::Nearest),
    );
    let is_max = x.clone().equal(spread);

    // offset of every cell in the uncropped plane
    let rows = Tensor::<B, 1, Int>::arange(0..(h * 2) as i64, &device)
        .float()
        .mul_scalar(width as f64)
        .reshape([1, 1, h * 2, 1]);
    let cols = Tensor::<B, 1, Int>::arange(0..(w * 2) as i64, &device)
        .float()
        .reshape([1, 1, 1, w * 2]);
    let offsets = x.zeros_like().add(rows).add(cols);

    // smallest offset holding the maximum, as a negated max-pool
    let candidates = offsets
        .mask_fill(is_max.bool_not(), (height * width) as f64)
        .neg();
    let indices = max_pool2d(candidates, WINDOW, WINDOW, [0, 0], [1, 1])
        .neg()
        .int();

    (pooled, indices)
}

/// Inverse of [`max_pool`]: writes each value back at its recorded offset in
/// a zero plane of `output_size`, or of exactly twice the input when no size
/// is given.
pub fn max_unpool<B: Backend>(
    input: Tensor<B, 4>,
    indices: Tensor<B, 4, Int>,
    output_size: Option<[usize; 2]>,
) -> Result<Tensor<B, 4>> {
    let [batch, channels, height, width] = input.dims();
    let [out_height, out_width] = output_size.unwrap_or([height * 2, width * 2]);

    let fits = |input: usize, target: usize| target == input * 2 || target == input * 2 + 1;
    if !fits(height, out_height) || !fits(width, out_width) {
        return Err(SegNetError::UnpoolSize {
            input: [height, width],
            target: [out_height, out_width],
        });
    }

    let values = input.reshape([batch, channels, height * width]);
    let indices = indices.reshape([batch, channels, height * width]);
    let plane = Tensor::<B, 3>::zeros([batch, channels, out_height * out_width], &values.device());

    Ok(plane
        .scatter(2, indices, values)
        .reshape([batch, channels, out_height, out_width]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn sample(device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 4> {
        Tensor::from_floats(
            [[[
                [1.0, 5.0, 2.0, 0.0],
                [3.0, 4.0, 8.0, 1.0],
                [0.0, 2.0, 1.0, 1.0],
                [9.0, 1.0, 6.0, 7.0],
            ]]],
            device,
        )
    }

    #[test]
    fn pool_records_flat_offsets() {
        let device = Default::default();
        let (pooled, indices) = max_pool(sample(&device));

        assert_eq!(
            pooled.into_data().to_vec::<f32>().unwrap(),
            vec![5.0, 8.0, 9.0, 7.0]
        );
        assert_eq!(
            indices.into_data().to_vec::<i64>().unwrap(),
            vec![1, 6, 12, 15]
        );
    }

    #[test]
    fn unpool_restores_maxima_and_zeroes_the_rest() {
        let device = Default::default();
        let (pooled, indices) = max_pool(sample(&device));
        let unpooled = max_unpool(pooled, indices, Some([4, 4])).unwrap();

        assert_eq!(
            unpooled.into_data().to_vec::<f32>().unwrap(),
            vec![
                0.0, 5.0, 0.0, 0.0, //
                0.0, 0.0, 8.0, 0.0, //
                0.0, 0.0, 0.0, 0.0, //
                9.0, 0.0, 0.0, 7.0,
            ]
        );
    }

    fn pool_and_unpool(
        rows: usize,
        cols: usize,
        values: &[f32],
    ) -> (Vec<f32>, Vec<i64>, Vec<f32>) {
        let device = Default::default();
        let data = TensorData::new(values.to_vec(), [1, 1, rows, cols]);
        let input = Tensor::<TestBackend, 4>::from_data(data, &device);
        let (pooled, indices) = max_pool(input);
        let unpooled = max_unpool(pooled.clone(), indices.clone(), Some([rows, cols])).unwrap();

        (
            pooled.into_data().to_vec::<f32>().unwrap(),
            indices.into_data().to_vec::<i64>().unwrap(),
            unpooled.into_data().to_vec::<f32>().unwrap(),
        )
    }

    #[test]
    fn wide_plane_keeps_positions() {
        let (pooled, indices, unpooled) =
            pool_and_unpool(2, 4, &[0.0, 1.0, 2.0, 0.0, 5.0, 0.0, 0.0, 6.0]);

        assert_eq!(pooled, vec![5.0, 6.0]);
        assert_eq!(indices, vec![4, 7]);
        assert_eq!(unpooled, vec![0.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0, 6.0]);
    }

    #[test]
    fn tall_plane_keeps_positions() {
        let (pooled, indices, unpooled) =
            pool_and_unpool(4, 2, &[0.0, 1.0, 5.0, 0.0, 0.0, 2.0, 3.0, 0.0]);

        assert_eq!(pooled, vec![5.0, 3.0]);
        assert_eq!(indices, vec![2, 6]);
        assert_eq!(unpooled, vec![0.0, 0.0, 5.0, 0.0, 0.0, 0.0, 3.0, 0.0]);
    }

    #[test]
    fn odd_wide_plane_keeps_positions() {
        #[rustfmt::skip]
        let values = [
            1.0, 0.0, 2.0, 0.0, 9.0,
            7.0, 0.0, 0.0, 3.0, 0.0,
            4.0, 4.0, 4.0, 4.0, 4.0,
        ];
        let (pooled, indices, unpooled) = pool_and_unpool(3, 5, &values);

        assert_eq!(pooled, vec![7.0, 3.0]);
        assert_eq!(indices, vec![5, 8]);
        let mut expected = vec![0.0; 15];
        expected[5] = 7.0;
        expected[8] = 3.0;
        assert_eq!(unpooled, expected);
    }

    #[test]
    fn odd_tall_plane_keeps_positions() {
        #[rustfmt::skip]
        let values = [
            0.0, 1.0, 4.0,
            2.0, 0.0, 4.0,
            0.0, 0.0, 4.0,
            0.0, 8.0, 4.0,
            9.0, 9.0, 9.0,
        ];
        let (pooled, indices, unpooled) = pool_and_unpool(5, 3, &values);

        assert_eq!(pooled, vec![2.0, 8.0]);
        assert_eq!(indices, vec![3, 10]);
        let mut expected = vec![0.0; 15];
        expected[3] = 2.0;
        expected[10] = 8.0;
        assert_eq!(unpooled, expected);
    }

    #[test]
    fn ties_go_to_the_first_cell() {
        let (_, indices, _) = pool_and_unpool(2, 4, &[3.0; 8]);
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn unpool_defaults_to_double_size() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::ones([2, 3, 4, 4], &device);
        let (pooled, indices) = max_pool(input);

        let unpooled = max_unpool(pooled, indices, None).unwrap();
        assert_eq!(unpooled.dims(), [2, 3, 4, 4]);
    }

    #[test]
    fn odd_sizes_drop_the_trailing_row_and_column() {
        let device = Default::default();
        let input = Tensor::<TestBackend, 4>::ones([1, 2, 5, 7], &device);
        let (pooled, indices) = max_pool(input);
        assert_eq!(pooled.dims(), [1, 2, 2, 3]);

        let unpooled = max_unpool(pooled, indices, Some([5, 7])).unwrap();
        assert_eq!(unpooled.dims(), [1, 2, 5, 7]);

        let values = unpooled.into_data().to_vec::<f32>().unwrap();
        // last row and last column of each plane stay empty
        for plane in values.chunks(35) {
            assert!(plane[28..].iter().all(|v| *v == 0.0));
            assert!(plane.chunks(7).all(|row| row[6] == 0.0));
            assert_eq!(plane.iter().sum::<f32>(), 6.0);
        }
    }

    #[test]
    fn rejects_targets_that_cannot_hold_the_input() {
        let device = Default::default();
        let (pooled, indices) = max_pool(sample(&device));

        let err = max_unpool(pooled, indices, Some([6, 4])).unwrap_err();
        assert_eq!(
            err,
            SegNetError::UnpoolSize {
                input: [2, 2],
                target: [6, 4],
            }
        );
    }
}

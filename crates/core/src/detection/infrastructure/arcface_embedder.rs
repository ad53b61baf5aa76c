/// ArcFace face embedder using ONNX Runtime.
///
/// Produces a 512-d descriptor per face crop. Vectors are L2-normalized so
/// a dot product between two of them is their cosine similarity.
use std::path::Path;

use super::execution_provider::load_session;
use crate::shared::math::l2_normalize;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: ort::session::Session,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
        })
    }

    /// Embeds a packed RGB24 crop of `width` × `height` pixels.
    pub fn embed(
        &mut self,
        rgb_data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        if width == 0 || height == 0 {
            return Err("Cannot embed an empty crop".into());
        }

        let tensor = preprocess(rgb_data, width, height);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Resize crop to 112x112 (nearest, sampling pixel centres), scale to
/// [-1, 1], NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if let Some(px) = rgb_data.get(offset..offset + 3) {
                for (c, &v) in px.iter().enumerate() {
                    tensor[[0, c, y, x]] = (v as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess(&[0u8; 20 * 10 * 3], 20, 10);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[rstest]
    #[case(0, -1.0)]
    #[case(127, (127.0 - 127.5) / 127.5)]
    #[case(255, 1.0)]
    fn test_preprocess_normalization(#[case] value: u8, #[case] expected: f32) {
        let tensor = preprocess(&[value; 4 * 4 * 3], 4, 4);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], expected, epsilon = 1e-6);
        assert_relative_eq!(tensor[[0, 2, 111, 111]], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_preprocess_keeps_channel_order() {
        // Single pure-red pixel upscaled to the whole input.
        let tensor = preprocess(&[255, 0, 0], 1, 1);
        assert_relative_eq!(tensor[[0, 0, 50, 50]], 1.0);
        assert_relative_eq!(tensor[[0, 1, 50, 50]], -1.0);
        assert_relative_eq!(tensor[[0, 2, 50, 50]], -1.0);
    }

    #[test]
    fn test_preprocess_short_buffer_leaves_zeros() {
        let tensor = preprocess(&[255u8; 3], 2, 2);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 0, 111, 111]], 0.0);
    }
}

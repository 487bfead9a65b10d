/// Fixed-size contiguous `[x, y, z, x, y, z, ...]` storage, indexed by `3 * i + component`.
#[derive(Default, Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Vec3Buffer {
    data: Vec<f32>,
}

impl Vec3Buffer {
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0.0; len * 3],
        }
    }

    pub fn from_vectors(vectors: &[nalgebra_glm::Vec3]) -> Self {
        let mut buffer = Self::zeroed(vectors.len());
        vectors
            .iter()
            .enumerate()
            .for_each(|(index, vector)| buffer.set(index, vector));
        buffer
    }

    pub fn len(&self) -> usize {
        self.data.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> nalgebra_glm::Vec3 {
        let base = index * 3;
        nalgebra_glm::vec3(self.data[base], self.data[base + 1], self.data[base + 2])
    }

    pub fn set(&mut self, index: usize, value: &nalgebra_glm::Vec3) {
        let base = index * 3;
        self.data[base] = value.x;
        self.data[base + 1] = value.y;
        self.data[base + 2] = value.z;
    }

    pub fn iter(&self) -> impl Iterator<Item = nalgebra_glm::Vec3> + '_ {
        self.data
            .chunks_exact(3)
            .map(|chunk| nalgebra_glm::vec3(chunk[0], chunk[1], chunk[2]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_layout() {
        let mut buffer = Vec3Buffer::zeroed(2);
        buffer.set(1, &nalgebra_glm::vec3(1.0, 2.0, 3.0));
        assert_eq!(buffer.data, vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(buffer.get(0), nalgebra_glm::Vec3::zeros());
        assert_eq!(buffer.get(1), nalgebra_glm::vec3(1.0, 2.0, 3.0));
    }

    #[test]
    fn from_vectors() {
        let buffer = Vec3Buffer::from_vectors(&[
            nalgebra_glm::vec3(1.0, 0.0, 0.0),
            nalgebra_glm::vec3(0.0, 1.0, 0.0),
        ]);
        assert_eq!(buffer.len(), 2);
        assert!(!buffer.is_empty());
        assert_eq!(
            buffer.iter().collect::<Vec<_>>(),
            vec![
                nalgebra_glm::vec3(1.0, 0.0, 0.0),
                nalgebra_glm::vec3(0.0, 1.0, 0.0)
            ]
        );
    }
}

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{EmotionError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// Wraps a single row vector as a 1×n matrix.
    pub fn row(values: Vec<f64>) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values] }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map(|r| r.len()).unwrap_or(0),
            data,
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    fn sample_standard_normal(rng: &mut ThreadRng) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    fn sampled(rows: usize, cols: usize, std_dev: f64) -> Matrix {
        let mut rng = rand::thread_rng();
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for value in row.iter_mut() {
                *value = Matrix::sample_standard_normal(&mut rng) * std_dev;
            }
        }
        res
    }

    /// He initialization: N(0, sqrt(2 / fan_in)), where `rows` is the fan-in.
    ///
    /// Weights are stored input-major (rows = inputs, cols = neurons) so a
    /// 1×rows activation row multiplies straight through.
    pub fn he(rows: usize, cols: usize) -> Matrix {
        Matrix::sampled(rows, cols, (2.0 / rows.max(1) as f64).sqrt())
    }

    /// Xavier (Glorot) initialization: N(0, sqrt(1 / fan_in)).
    pub fn xavier(rows: usize, cols: usize) -> Matrix {
        Matrix::sampled(rows, cols, (1.0 / rows.max(1) as f64).sqrt())
    }

    /// Checks that `rows`/`cols` agree with the stored data. Deserialized
    /// matrices are not trusted until this passes.
    pub fn validate(&self) -> Result<()> {
        if self.data.len() != self.rows {
            return Err(EmotionError::Model(format!(
                "matrix declares {} rows but holds {}", self.rows, self.data.len()
            )));
        }
        if let Some(bad) = self.data.iter().position(|r| r.len() != self.cols) {
            return Err(EmotionError::Model(format!(
                "matrix row {} has {} values, expected {}", bad, self.data[bad].len(), self.cols
            )));
        }
        Ok(())
    }

    /// Checked matrix product `self × rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(EmotionError::Shape { expected: rhs.rows, actual: self.cols });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }
        Ok(res)
    }

    /// Checked element-wise sum.
    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            return Err(EmotionError::Shape {
                expected: self.rows * self.cols,
                actual: rhs.rows * rhs.cols,
            });
        }
        let data = self.data.iter().zip(rhs.data.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| x + y).collect())
            .collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }
}

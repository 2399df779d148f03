use failure::bail;
use ndarray::prelude::*;

use crate::errors::*;

/// The multiclass probability estimates are derived from binary (one-vs.-rest)
/// estimates by simple normalization
pub struct MulticlassLogisticRegression {
    /// shape (c,) with c the number of classes
    intercept: Array1<f32>,
    /// matrix with shape (f, c)
    /// ------------------------
    ///
    /// - f = number of features
    /// - c = number of classes
    weights: Array2<f32>,
}

impl MulticlassLogisticRegression {
    pub fn nb_features(&self) -> usize {
        self.weights.dim().0
    }

    /// Number of probabilities returned by `run`
    pub fn nb_outputs(&self) -> usize {
        if self.is_binary() {
            2
        } else {
            self.nb_classes()
        }
    }

    fn nb_classes(&self) -> usize {
        self.weights.dim().1
    }

    fn is_binary(&self) -> bool {
        self.nb_classes() == 1
    }
}

impl MulticlassLogisticRegression {
    pub fn new(intercept: Array1<f32>, weights: Array2<f32>) -> Result<Self> {
        if intercept.dim() != weights.dim().1 {
            bail!(
                "Intercept size ({}) does not match the number of classes ({})",
                intercept.dim(),
                weights.dim().1
            );
        }
        Ok(Self { intercept, weights })
    }

    /// Builds the regression from the class-major coefficients found in the model files
    pub fn from_coeffs(intercept: Vec<f32>, coeffs: Vec<Vec<f32>>) -> Result<Self> {
        let nb_classes = coeffs.len();
        let nb_features = coeffs.first().map(|class| class.len()).unwrap_or(0);
        if coeffs.iter().any(|class| class.len() != nb_features) {
            bail!("Coefficients of the intent classifier have inconsistent sizes");
        }
        let weights = Array::from_shape_fn((nb_features, nb_classes), |(i, j)| coeffs[j][i]);
        Self::new(Array::from_vec(intercept), weights)
    }

    pub fn run(
        &self,
        features: &ArrayView1<f32>,
        filtered_out_indexes: Option<Vec<usize>>,
    ) -> Result<Array1<f32>> {
        if features.dim() != self.nb_features() {
            bail!(
                "Expected {} features but found {}",
                self.nb_features(),
                features.dim()
            );
        }
        let mut result = features.dot(&self.weights) + &self.intercept;
        result.mapv_inplace(logit);
        if self.is_binary() {
            return Ok(arr1(&[1.0 - result[0], result[0]]));
        }
        for index in filtered_out_indexes.unwrap_or_else(Vec::new) {
            result[index] = 0.0;
        }
        let divider = result.sum();
        if divider > 0.0 {
            result /= divider;
        }
        Ok(result)
    }
}

fn logit(x: f32) -> f32 {
    1. / (1. + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::MulticlassLogisticRegression;
    use crate::testutils::assert_epsilon_eq_array1;
    use ndarray::array;

    fn regression() -> MulticlassLogisticRegression {
        let intercept = array![0.98, 0.32, -0.76];
        let weights = array![
            [2.5, -0.6, 0.5],
            [1.2, 1.2, -2.7],
            [1.5, 0.1, -3.2],
            [-0.9, 1.4, 1.8]
        ];
        MulticlassLogisticRegression::new(intercept, weights).unwrap()
    }

    #[test]
    fn multiclass_logistic_regression_works() {
        // Given
        let features = array![0.4, -2.3, 1.9, 1.3];
        let regression = regression();

        // When
        let predictions = regression.run(&features.view(), None).unwrap();

        // Then
        // one-vs-rest probabilities 0.7109495, 0.3384968 and 0.8710191, normalized
        let expected_predictions = array![0.37019645, 0.17625771, 0.45354585];
        assert_epsilon_eq_array1(&predictions, &expected_predictions, 1e-06);
    }

    #[test]
    fn multiclass_logistic_regression_works_when_binary() {
        // Given
        let intercept = array![0.98];
        let weights = array![[2.5], [1.2], [1.5], [-0.9]];

        let features = array![0.4, -2.3, 1.9, 1.3];
        let regression = MulticlassLogisticRegression::new(intercept, weights).unwrap();

        // When
        let predictions = regression.run(&features.view(), None).unwrap();

        // Then
        let expected_predictions = array![0.2890504, 0.7109495];
        assert_epsilon_eq_array1(&predictions, &expected_predictions, 1e-06);
    }

    #[test]
    fn multiclass_logistic_regression_works_with_filtered_out_indexes() {
        // Given
        let features = array![0.4, -2.3, 1.9, 1.3];
        let filtered_out_indexes = Some(vec![2]);
        let regression = regression();

        // When
        let predictions = regression
            .run(&features.view(), filtered_out_indexes)
            .unwrap();

        // Then
        let expected_predictions = array![0.67745198, 0.32254802, 0.0];
        assert_epsilon_eq_array1(&predictions, &expected_predictions, 1e-06);
    }

    #[test]
    fn multiclass_logistic_regression_from_class_major_coeffs() {
        // Given
        let coeffs = vec![
            vec![2.5, 1.2, 1.5, -0.9],
            vec![-0.6, 1.2, 0.1, 1.4],
            vec![0.5, -2.7, -3.2, 1.8],
        ];
        let regression =
            MulticlassLogisticRegression::from_coeffs(vec![0.98, 0.32, -0.76], coeffs).unwrap();
        let features = array![0.4, -2.3, 1.9, 1.3];

        // When
        let predictions = regression.run(&features.view(), None).unwrap();

        // Then
        let expected_predictions = array![0.37019645, 0.17625771, 0.45354585];
        assert_epsilon_eq_array1(&predictions, &expected_predictions, 1e-06);
    }

    #[test]
    fn multiclass_logistic_regression_rejects_wrong_feature_size() {
        // Given
        let features = array![0.4, -2.3];

        // When
        let predictions = regression().run(&features.view(), None);

        // Then
        assert!(predictions.is_err());
    }
}

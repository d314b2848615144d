use rigid_3d::{
    linalg::{self, centroid, det33, matmul33, transpose33},
    GeometryError, RigidTransform,
};

use crate::IcpError;

// singular values below this fraction of the largest one count as zero
const RANK_EPSILON: f64 = 1e-10;

/// Advisory flag raised when the optimal rotation is not unique.
///
/// The returned transform is still a valid minimizer.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericDegeneracy {
    /// Less than three point pairs.
    #[error("only {0} point pairs, the rotation is underdetermined")]
    TooFewPoints(usize),

    /// The cross-covariance matrix has rank below two (coincident or collinear points).
    #[error("cross-covariance has rank {rank}, the rotation is underdetermined")]
    RankDeficient {
        /// Numerical rank of the cross-covariance matrix.
        rank: usize,
    },
}

/// Output of [`fit_transformation`].
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Transform taking the source points onto the destination points.
    pub transform: RigidTransform,
    /// Singular values of the cross-covariance matrix, non-increasing.
    pub singular_values: [f64; 3],
    /// True when the raw SVD solution was a reflection and had to be corrected.
    pub reflection_corrected: bool,
    /// Set when the solution is not unique.
    pub degeneracy: Option<NumericDegeneracy>,
}

/// Compute the rigid transformation that best maps paired points.
///
/// `points_in_src[i]` corresponds to `points_in_dst[i]`. The result minimizes
/// the sum of squared distances between `R * src[i] + t` and `dst[i]`:
///
/// 1. Compute the centroids of both sets.
/// 2. Compute the cross-covariance H = Σ[(src - src_mean) * (dst - dst_mean)^T].
/// 3. Compute the SVD H = U * S * V^T.
/// 4. R = V * U^T, negating the last column of V when det(R) < 0.
/// 5. t = dst_mean - R * src_mean.
///
/// For more details, see: Arun, K., Huang, T. S., and Blostein, S. D.
/// "Least-squares fitting of two 3-D point sets." IEEE PAMI, 1987.
///
/// # Arguments
///
/// * `points_in_src` - Source points.
/// * `points_in_dst` - Destination points, same length as `points_in_src`.
///
/// # Returns
///
/// The alignment, or an error if the inputs are empty or have different lengths.
pub fn fit_transformation(
    points_in_src: &[[f64; 3]],
    points_in_dst: &[[f64; 3]],
) -> Result<Alignment, IcpError> {
    if points_in_src.len() != points_in_dst.len() {
        return Err(
            GeometryError::MismatchedLength(points_in_src.len(), points_in_dst.len()).into(),
        );
    }
    if points_in_src.is_empty() {
        return Err(GeometryError::EmptyPointSet.into());
    }

    let src_centroid = centroid(points_in_src);
    let dst_centroid = centroid(points_in_dst);

    // H = Σ[(src - src_mean) * (dst - dst_mean)^T]
    let mut h = [[0.0; 3]; 3];
    for (p_in_src, p_in_dst) in points_in_src.iter().zip(points_in_dst.iter()) {
        let src_centered = [
            p_in_src[0] - src_centroid[0],
            p_in_src[1] - src_centroid[1],
            p_in_src[2] - src_centroid[2],
        ];
        let dst_centered = [
            p_in_dst[0] - dst_centroid[0],
            p_in_dst[1] - dst_centroid[1],
            p_in_dst[2] - dst_centroid[2],
        ];
        for (row, s) in h.iter_mut().zip(src_centered.iter()) {
            for (val, d) in row.iter_mut().zip(dst_centered.iter()) {
                *val += s * d;
            }
        }
    }

    let svd = faer::Mat::<f64>::from_fn(3, 3, |i, j| h[i][j]).svd();
    let u = mat33_from_faer(svd.u());
    let mut v = mat33_from_faer(svd.v());
    let s = svd.s_diagonal();
    let singular_values = [s.read(0), s.read(1), s.read(2)];

    let ut = transpose33(&u);
    let mut rotation = matmul33(&v, &ut);

    // flip the singular vector of the smallest singular value to avoid a reflection
    let reflection_corrected = det33(&rotation) < 0.0;
    if reflection_corrected {
        for row in v.iter_mut() {
            row[2] = -row[2];
        }
        rotation = matmul33(&v, &ut);
    }

    let rotated_centroid = linalg::matvec33(&rotation, &src_centroid);
    let translation = [
        dst_centroid[0] - rotated_centroid[0],
        dst_centroid[1] - rotated_centroid[1],
        dst_centroid[2] - rotated_centroid[2],
    ];

    Ok(Alignment {
        transform: RigidTransform::new(rotation, translation),
        singular_values,
        reflection_corrected,
        degeneracy: detect_degeneracy(points_in_src.len(), &singular_values),
    })
}

fn detect_degeneracy(num_points: usize, singular_values: &[f64; 3]) -> Option<NumericDegeneracy> {
    if num_points < 3 {
        return Some(NumericDegeneracy::TooFewPoints(num_points));
    }

    let largest = singular_values[0];
    let rank = if largest > 0.0 {
        singular_values
            .iter()
            .filter(|&&s| s > RANK_EPSILON * largest)
            .count()
    } else {
        0
    };

    // rank two still fixes the third axis through the cross product
    (rank < 2).then_some(NumericDegeneracy::RankDeficient { rank })
}

fn mat33_from_faer(m: faer::MatRef<'_, f64>) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = m.read(i, j);
        }
    }
    out
}

use super::*;
use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;

fn m(rows: Vec<Vec<Entry>>) -> Matrix {
    Matrix::new(rows).unwrap()
}

fn m4() -> Matrix {
    m(vec![
        vec![0, 1, 2, 3],
        vec![4, 5, 6, 7],
        vec![8, 9, 10, 11],
        vec![12, 13, 14, 15],
    ])
}

fn m4_rev() -> Matrix {
    m(vec![
        vec![15, 14, 13, 12],
        vec![11, 10, 9, 8],
        vec![7, 6, 5, 4],
        vec![3, 2, 1, 0],
    ])
}

fn arbitrary_entries(g: &mut Gen, n: usize) -> Vec<Entry> {
    (0..n).map(|_| (i8::arbitrary(g) % 20) as Entry).collect()
}

fn arbitrary_dim(g: &mut Gen) -> usize {
    usize::arbitrary(g) % 5 + 1
}

impl Arbitrary for Matrix {
    fn arbitrary(g: &mut Gen) -> Self {
        let (rows, cols) = (arbitrary_dim(g), arbitrary_dim(g));
        Matrix::from_flat(rows, cols, arbitrary_entries(g, rows * cols))
    }
}

#[derive(Clone, Debug)]
struct SameShape(Matrix, Matrix);

impl Arbitrary for SameShape {
    fn arbitrary(g: &mut Gen) -> Self {
        let a = Matrix::arbitrary(g);
        let b = Matrix::from_flat(a.rows(), a.cols(), arbitrary_entries(g, a.rows() * a.cols()));
        SameShape(a, b)
    }
}

#[derive(Clone, Debug)]
struct Square(Matrix);

impl Arbitrary for Square {
    fn arbitrary(g: &mut Gen) -> Self {
        let n = usize::arbitrary(g) % 6 + 1;
        Square(Matrix::from_flat(n, n, arbitrary_entries(g, n * n)))
    }
}

#[quickcheck]
fn add_is_cellwise(SameShape(a, b): SameShape) -> bool {
    let c = add(&a, &b).unwrap();
    (0..a.rows()).all(|i| (0..a.cols()).all(|j| c.get(i, j) == a.get(i, j) + b.get(i, j)))
}

#[quickcheck]
fn hadamard_is_cellwise(SameShape(a, b): SameShape) -> bool {
    let c = hadamard(&a, &b).unwrap();
    (0..a.rows()).all(|i| (0..a.cols()).all(|j| c.get(i, j) == a.get(i, j) * b.get(i, j)))
}

#[quickcheck]
fn transpose_swaps(a: Matrix) -> bool {
    let t = transpose(&a);
    t.shape() == (a.cols(), a.rows())
        && (0..a.rows()).all(|i| (0..a.cols()).all(|j| t.get(j, i) == a.get(i, j)))
        && transpose(&t) == a
}

#[quickcheck]
fn determinant_matches_elimination(Square(a): Square) -> bool {
    Integer::from(determinant(&a).unwrap()) == determinant_elim(&a).unwrap()
}

#[quickcheck]
fn power3_is_triple_product(Square(a): Square) -> bool {
    power3(&a).unwrap() == multiply(&multiply(&a, &a).unwrap(), &a).unwrap()
}

#[quickcheck]
fn convolve_output_dims(a: Matrix, f: Matrix, stride: u8) -> bool {
    let stride = stride as usize % 3 + 1;
    let out = convolve(&a, &f, stride).unwrap();
    if f.rows() > a.rows() || f.cols() > a.cols() {
        out.shape() == (0, 0)
    } else {
        out.shape()
            == (
                (a.rows() - f.rows()) / stride + 1,
                (a.cols() - f.cols()) / stride + 1,
            )
    }
}

#[test]
fn determinant_base_cases() {
    assert_eq!(determinant(&m(vec![vec![-7]])).unwrap(), -7);
    assert_eq!(determinant(&m(vec![vec![3, 8], vec![4, 6]])).unwrap(), 18 - 32);
    assert_eq!(
        determinant(&m(vec![vec![2, -1, 0], vec![1, 3, 4], vec![0, 5, -2]])).unwrap(),
        -54
    );
}

#[test]
fn determinant_singular_fixture() {
    assert_eq!(determinant(&m4()).unwrap(), 0);
    assert_eq!(determinant_elim(&m4()).unwrap(), 0);
}

#[test]
fn determinant_needs_pivot() {
    let a = m(vec![vec![0, 1, 2], vec![1, 0, 3], vec![4, -3, 8]]);
    assert_eq!(
        Integer::from(determinant(&a).unwrap()),
        determinant_elim(&a).unwrap()
    );
}

#[test]
fn determinant_rejects() {
    assert!(matches!(
        determinant(&m(vec![vec![1, 2, 3], vec![4, 5, 6]])),
        Err(OracleError::NotSquare { rows: 2, cols: 3, .. })
    ));
    assert_eq!(determinant(&m(vec![])), Err(OracleError::Empty));
}

#[test]
fn matrix_vector_fixture() {
    let v = m(vec![vec![15], vec![11], vec![4], vec![1]]);
    assert_eq!(multiply_flat(&m4(), &v).unwrap(), vec![14, 78, 142, 206]);
}

#[test]
fn multiply_fixture() {
    assert_eq!(
        multiply_flat(&m4(), &m4_rev()).unwrap(),
        vec![34, 28, 22, 16, 178, 156, 134, 112, 322, 284, 246, 208, 466, 412, 358, 304]
    );
}

#[test]
fn power_fixture() {
    assert_eq!(
        power3(&m4()).unwrap().flat(),
        &[
            1680, 1940, 2200, 2460, 4880, 5620, 6360, 7100, 8080, 9300, 10520, 11740, 11280,
            12980, 14680, 16380
        ]
    );
}

#[test]
fn multiply_mismatch() {
    let v = m(vec![vec![1, 2, 3]]);
    assert_eq!(
        multiply(&m4(), &v),
        Err(OracleError::DimensionMismatch {
            op: "multiply",
            left: (4, 4),
            right: (1, 3),
        })
    );
    assert!(power3(&v).is_err());
}

#[test]
fn add_mismatch() {
    let small = m(vec![vec![1, 2], vec![3, 4]]);
    assert!(matches!(
        add(&m4(), &small),
        Err(OracleError::DimensionMismatch { op: "add", .. })
    ));
    assert!(matches!(
        hadamard(&small, &m4()),
        Err(OracleError::DimensionMismatch { op: "hadamard", .. })
    ));
}

#[test]
fn add_and_hadamard_fixtures() {
    assert_eq!(add(&m4(), &m4_rev()).unwrap().flat(), &[15; 16]);
    assert_eq!(
        hadamard(&m4(), &m4_rev()).unwrap().row(0),
        &[0, 14, 26, 36]
    );
}

#[test]
fn scalar_fixture() {
    assert_eq!(scalar_mult(&m4(), 3).row(3), &[36, 39, 42, 45]);
    assert_eq!(scalar_mult(&m4(), -1).get(1, 1), -5);
}

#[test]
fn transpose_rectangular() {
    let a = m(vec![
        vec![0, 1, 2],
        vec![4, 5, 6],
        vec![8, 9, 10],
        vec![12, 13, 14],
    ]);
    let t = transpose(&a);
    assert_eq!(t.shape(), (3, 4));
    assert_eq!(t.flat(), &[0, 4, 8, 12, 1, 5, 9, 13, 2, 6, 10, 14]);
}

#[test]
fn convolution_stride_one() {
    let f = m(vec![vec![2, 2], vec![3, 3]]);
    let out = convolve(&m4(), &f, 1).unwrap();
    assert_eq!(out.shape(), (3, 3));
    assert_eq!(out.get(0, 0), 29);
}

#[test]
fn convolution_stride_two() {
    let f = m(vec![vec![2, 2], vec![3, 3]]);
    let out = convolve(&m4(), &f, 2).unwrap();
    assert_eq!(out.to_rows(), vec![vec![29, 49], vec![109, 129]]);
}

#[test]
fn convolution_degenerate() {
    let f = m(vec![vec![1; 5]; 5]);
    assert_eq!(convolve(&m4(), &f, 1).unwrap().shape(), (0, 0));
    assert_eq!(convolve(&m4(), &m4(), 1).unwrap().flat(), &[1240]);
    assert_eq!(convolve(&m4(), &f, 0), Err(OracleError::ZeroStride));
    assert!(convolve(&m4(), &m(vec![]), 1).is_err());
}

#[test]
fn ragged_rejected() {
    assert_eq!(
        Matrix::new(vec![vec![1, 2], vec![3]]),
        Err(OracleError::Ragged {
            row: 1,
            len: 1,
            expected: 2
        })
    );
}

#[test]
fn minor_drops_row_and_col() {
    assert_eq!(
        minor(&m4(), 0, 1).to_rows(),
        vec![vec![4, 6, 7], vec![8, 10, 11], vec![12, 14, 15]]
    );
}

#[test]
fn overflow_wraps() {
    let big = m(vec![vec![Entry::MAX, Entry::MIN]]);
    let one = m(vec![vec![1, -1]]);
    assert_eq!(add(&big, &one).unwrap().flat(), &[Entry::MIN, Entry::MAX]);
    assert_eq!(scalar_mult(&big, 2).flat(), &[-2, 0]);
    assert_eq!(hadamard(&big, &big).unwrap().flat(), &[1, 0]);
    let col = m(vec![vec![1], vec![1]]);
    assert_eq!(multiply_flat(&big, &col).unwrap(), vec![-1]);
    let sq = m(vec![vec![Entry::MAX, 2], vec![2, Entry::MAX]]);
    assert_eq!(determinant(&sq).unwrap(), 1i64.wrapping_sub(4));
    assert_eq!(
        convolve(&sq, &m(vec![vec![1, 1], vec![0, 0]]), 1).unwrap().flat(),
        &[Entry::MIN + 1]
    );
}

#[test]
#[should_panic]
fn minor_out_of_range() {
    minor(&m4(), 4, 0);
}

#[test]
fn serde_as_nested_rows() {
    let json = serde_json::to_string(&m4()).unwrap();
    assert!(json.starts_with("[[0,1,2,3],"));
    let back: Matrix = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m4());
    assert!(serde_json::from_str::<Matrix>("[[1,2],[3]]").is_err());
}

//! Размеры глобального пространства индексов и рабочих групп

use crate::error::{Error, Result};

/// Максимальная размерность NDRange в OpenCL
pub const MAX_DIMENSIONS: usize = 3;

/// Округляет `value` вверх до кратного `multiple`
pub fn round_up(value: usize, multiple: usize) -> usize {
    if multiple == 0 {
        return value;
    }
    value.div_ceil(multiple) * multiple
}

/// Целый корень степени `k` с округлением вниз, не меньше 1
pub fn iroot(n: usize, k: usize) -> usize {
    if n <= 1 || k <= 1 {
        return n.max(1);
    }
    let mut root = (n as f64).powf(1.0 / k as f64) as usize;
    while root > 1 && pow(root, k) > n {
        root -= 1;
    }
    while pow(root + 1, k) <= n {
        root += 1;
    }
    root.max(1)
}

fn pow(base: usize, exp: usize) -> usize {
    (0..exp).fold(1usize, |acc, _| acc.saturating_mul(base))
}

/// Готовая к запуску пара глобального и локального размеров.
///
/// Создается только конструкторами, поэтому ранги всегда совпадают и лежат в 1..=3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkSize {
    global: Vec<usize>,
    local: Vec<usize>,
}

impl WorkSize {
    /// Явный локальный размер; глобальный передается как есть
    pub fn explicit(global: &[usize], local: &[usize]) -> Result<Self> {
        check_global(global)?;
        check_local(global, local)?;
        Ok(Self {
            global: global.to_vec(),
            local: local.to_vec(),
        })
    }

    /// Локальный размер из предпочтительной кратности ядра.
    ///
    /// Для 1-D используется сама кратность; для k измерений каждое получает
    /// целый корень степени k из нее. Глобальный размер округляется вверх.
    pub fn from_preferred(global: &[usize], preferred: usize) -> Result<Self> {
        check_global(global)?;
        let side = iroot(preferred.max(1), global.len());
        Self::rounded(global, &vec![side; global.len()])
    }

    /// Локальный размер для изображения: кратность по обеим осям, пока
    /// квадрат не превышает предел ядра
    pub fn for_image(width: usize, height: usize, preferred: usize, kernel_max: usize) -> Result<Self> {
        let mut side = preferred.max(1);
        if kernel_max > 0 && side.saturating_mul(side) > kernel_max {
            side = iroot(kernel_max, 2);
        }
        Self::rounded(&[width, height], &[side, side])
    }

    /// Каждое глобальное измерение округляется до кратного локальному
    fn rounded(global: &[usize], local: &[usize]) -> Result<Self> {
        check_global(global)?;
        check_local(global, local)?;
        Ok(Self {
            global: global.iter().zip(local).map(|(&g, &l)| round_up(g, l)).collect(),
            local: local.to_vec(),
        })
    }

    pub fn global(&self) -> &[usize] {
        &self.global
    }

    pub fn local(&self) -> &[usize] {
        &self.local
    }

    pub fn dimensions(&self) -> usize {
        self.global.len()
    }
}

fn check_local(global: &[usize], local: &[usize]) -> Result<()> {
    if local.len() != global.len() {
        return Err(Error::InvalidWorkSize(format!(
            "local size has {} dimensions, global size has {}",
            local.len(),
            global.len()
        )));
    }
    if local.contains(&0) {
        return Err(Error::InvalidWorkSize("local size contains a zero dimension".into()));
    }
    Ok(())
}

fn check_global(global: &[usize]) -> Result<()> {
    if global.is_empty() || global.len() > MAX_DIMENSIONS {
        return Err(Error::InvalidWorkSize(format!(
            "expected 1 to {MAX_DIMENSIONS} dimensions, got {}",
            global.len()
        )));
    }
    if global.contains(&0) {
        return Err(Error::InvalidWorkSize("global size contains a zero dimension".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_to_multiple() {
        assert_eq!(round_up(1000, 64), 1024);
        assert_eq!(round_up(1024, 64), 1024);
        assert_eq!(round_up(1, 256), 256);
        assert_eq!(round_up(7, 0), 7);
    }

    #[test]
    fn integer_roots() {
        assert_eq!(iroot(64, 2), 8);
        assert_eq!(iroot(32, 2), 5);
        assert_eq!(iroot(1, 2), 1);
        assert_eq!(iroot(0, 2), 1);
        assert_eq!(iroot(64, 3), 4);
        assert_eq!(iroot(63, 3), 3);
        assert_eq!(iroot(48, 1), 48);
    }

    #[test]
    fn one_dimension_uses_preferred_multiple() {
        let ws = WorkSize::from_preferred(&[1000], 32).unwrap();
        assert_eq!(ws.local(), [32]);
        assert_eq!(ws.global(), [1024]);
    }

    #[test]
    fn two_dimensions_use_square_root() {
        let ws = WorkSize::from_preferred(&[7, 7], 32).unwrap();
        assert_eq!(ws.local(), [5, 5]);
        assert_eq!(ws.global(), [10, 10]);
        assert_eq!(ws.dimensions(), 2);
    }

    #[test]
    fn explicit_local_must_match_rank() {
        assert!(matches!(
            WorkSize::explicit(&[16, 16], &[4]),
            Err(Error::InvalidWorkSize(_))
        ));
        assert!(matches!(
            WorkSize::explicit(&[16], &[0]),
            Err(Error::InvalidWorkSize(_))
        ));
        let ws = WorkSize::explicit(&[1], &[1]).unwrap();
        assert_eq!(ws.global(), [1]);
    }

    #[test]
    fn rejects_bad_global_shapes() {
        assert!(WorkSize::from_preferred(&[], 32).is_err());
        assert!(WorkSize::from_preferred(&[1, 1, 1, 1], 32).is_err());
        assert!(WorkSize::from_preferred(&[0], 32).is_err());
    }

    #[test]
    fn image_local_size_respects_kernel_limit() {
        let ws = WorkSize::for_image(7, 7, 16, 256).unwrap();
        assert_eq!(ws.local(), [16, 16]);
        assert_eq!(ws.global(), [16, 16]);

        // 64 * 64 больше 1024, берется sqrt(1024)
        let ws = WorkSize::for_image(100, 50, 64, 1024).unwrap();
        assert_eq!(ws.local(), [32, 32]);
        assert_eq!(ws.global(), [128, 64]);
    }

    #[test]
    fn explicit_local_keeps_global_unchanged() {
        let ws = WorkSize::explicit(&[10], &[4]).unwrap();
        assert_eq!(ws.global(), [10]);
        assert_eq!(ws.local(), [4]);

        let ws = WorkSize::explicit(&[7, 9], &[2, 4]).unwrap();
        assert_eq!(ws.global(), [7, 9]);
    }

    #[test]
    fn every_constructor_keeps_ranks_consistent() {
        let sizes = [
            WorkSize::explicit(&[4, 4], &[2, 2]).unwrap(),
            WorkSize::from_preferred(&[5, 6, 7], 64).unwrap(),
            WorkSize::for_image(3, 3, 8, 16).unwrap(),
        ];
        for ws in &sizes {
            assert_eq!(ws.local().len(), ws.dimensions());
            assert!((1..=MAX_DIMENSIONS).contains(&ws.dimensions()));
            assert!(!ws.local().contains(&0));
        }
        assert!(WorkSize::explicit(&[4, 4], &[]).is_err());
        assert!(WorkSize::explicit(&[1, 1, 1, 1], &[1, 1, 1, 1]).is_err());
        assert!(WorkSize::explicit(&[0], &[1]).is_err());
    }
}

//! 신뢰도 스코어링
//!
//! 컨텍스트 슬롯이 얼마나 채워졌는지(coverage)에 비례해
//! `without_context` ~ `with_context` 사이 값을 부여합니다.
//!
//! confidence = without + (with - without) * (passages_used / context_passages)
//!
//! 백엔드별 스코어 스케일이 달라(해밍 거리 기반 vs 웹 고정값)
//! 스코어 값 자체는 사용하지 않습니다.

/// 컨텍스트가 가득 찼을 때의 신뢰도
pub const WITH_CONTEXT: f32 = 0.8;
/// 컨텍스트 없이 답변할 때의 신뢰도
pub const WITHOUT_CONTEXT: f32 = 0.3;
/// 컨텍스트 부족으로 답변하지 않을 때의 신뢰도
pub const INSUFFICIENT: f32 = 0.0;

/// 신뢰도 모델
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceModel {
    pub with_context: f32,
    pub without_context: f32,
    /// 컨텍스트 슬롯 수
    pub context_passages: usize,
}

impl ConfidenceModel {
    pub fn new(context_passages: usize) -> Self {
        Self {
            with_context: WITH_CONTEXT,
            without_context: WITHOUT_CONTEXT,
            context_passages: context_passages.max(1),
        }
    }

    /// 채워진 슬롯 비율 (0.0 ~ 1.0)
    pub fn coverage(&self, passages_used: usize) -> f32 {
        (passages_used as f32 / self.context_passages as f32).clamp(0.0, 1.0)
    }

    /// 사용된 패시지 수에 따른 신뢰도
    pub fn score(&self, passages_used: usize) -> f32 {
        if passages_used == 0 {
            return self.without_context;
        }

        let span = self.with_context - self.without_context;
        (self.without_context + span * self.coverage(passages_used)).clamp(0.0, 1.0)
    }

    /// 컨텍스트 부족 응답의 신뢰도
    pub fn insufficient(&self) -> f32 {
        INSUFFICIENT
    }
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_full_context() {
        let model = ConfidenceModel::new(3);
        assert!(approx(model.score(3), 0.8));
        // 슬롯 수를 넘어도 상한 유지
        assert!(approx(model.score(5), 0.8));
    }

    #[test]
    fn test_no_context() {
        let model = ConfidenceModel::new(3);
        assert!(approx(model.score(0), 0.3));
        assert_eq!(model.insufficient(), 0.0);
    }

    #[test]
    fn test_partial_coverage() {
        let model = ConfidenceModel::new(3);
        // 0.3 + 0.5 * (1/3)
        assert!(approx(model.score(1), 0.3 + 0.5 / 3.0));
        // 0.3 + 0.5 * (2/3)
        assert!(approx(model.score(2), 0.3 + 1.0 / 3.0));
        assert!(model.score(1) < model.score(2));
    }

    #[test]
    fn test_single_slot() {
        let model = ConfidenceModel::new(1);
        assert!(approx(model.score(1), 0.8));
    }

    #[test]
    fn test_zero_slots_clamped() {
        let model = ConfidenceModel::new(0);
        assert_eq!(model.context_passages, 1);
        assert!(approx(model.coverage(1), 1.0));
    }
}

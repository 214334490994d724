//! PerfMon 세션 모델.

/// 원격 수집 세션. 핸들이 비어 있지 않으면 열린 상태다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    handle: String,
}

impl Session {
    /// 열린 세션 여부
    pub fn is_open(&self) -> bool {
        !self.handle.is_empty()
    }

    /// 현재 세션 핸들 (닫혀 있으면 None)
    pub fn handle(&self) -> Option<&str> {
        if self.is_open() {
            Some(&self.handle)
        } else {
            None
        }
    }

    /// 원격에서 받은 핸들로 세션 열기
    pub fn open(&mut self, handle: impl Into<String>) {
        self.handle = handle.into();
    }

    /// 세션 무효화
    pub fn clear(&mut self) {
        self.handle.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_iff_handle_non_empty() {
        let mut session = Session::default();
        assert!(!session.is_open());
        assert_eq!(session.handle(), None);

        session.open("{6A3E-11}");
        assert!(session.is_open());
        assert_eq!(session.handle(), Some("{6A3E-11}"));

        session.clear();
        assert!(!session.is_open());

        session.open("");
        assert!(!session.is_open());
    }
}

//! freeze 명령 출력 리더
//!
//! [`FreezeReader`]는 `pip freeze`와 같은 명령을 실행하고 `name==version`
//! 형식의 줄을 [`PackageRecord`]로 변환합니다.
//!
//! # 출력 예시
//!
//! ```text
//! certifi==2024.2.2
//! -e git+https://github.com/org/app.git@abc123#egg=app
//! numpy @ file:///tmp/numpy-1.26.4.whl
//! requests==2.31.0
//! ```
//!
//! `==`가 정확히 한 번 나오는 줄만 사용하며, 나머지 줄은 건너뜁니다.

use std::process::Command;

use tracing::debug;

use super::MetadataSource;
use crate::error::SbomGeneratorError;
use crate::types::{Origin, PackageKey, PackageRecord, PartialCatalog};

/// freeze 명령 리더
pub struct FreezeReader {
    /// 실행할 명령 (argv)
    command: Vec<String>,
}

impl FreezeReader {
    /// 주어진 argv로 리더를 생성합니다.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// 명령줄 문자열을 반환합니다 (로그/에러 메시지용).
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    fn run(&self) -> Result<String, SbomGeneratorError> {
        let (program, args) =
            self.command
                .split_first()
                .ok_or_else(|| SbomGeneratorError::FreezeCommand {
                    command: String::new(),
                    reason: "empty command".to_owned(),
                })?;

        let output = Command::new(program).args(args).output().map_err(|e| {
            SbomGeneratorError::FreezeCommand {
                command: self.command_line(),
                reason: e.to_string(),
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SbomGeneratorError::FreezeCommand {
                command: self.command_line(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl MetadataSource for FreezeReader {
    fn origin(&self) -> Origin {
        Origin::FrozenListing
    }

    fn read(&self) -> Result<PartialCatalog, SbomGeneratorError> {
        let stdout = self.run()?;
        Ok(parse_freeze_output(&stdout))
    }
}

/// freeze 형식 출력을 파싱합니다.
///
/// 주석, 옵션 줄(`-e`, `--index-url`), 직접 참조(`name @ url`), 이름이나 버전이
/// 비어 있는 줄은 건너뜁니다. 같은 키가 반복되면 첫 줄을 유지합니다.
pub fn parse_freeze_output(output: &str) -> PartialCatalog {
    let mut packages = PartialCatalog::new();

    for line in output.lines() {
        let Some((name, version)) = parse_freeze_line(line) else {
            if !line.trim().is_empty() {
                debug!(line, "skipping freeze line");
            }
            continue;
        };

        let key = PackageKey::new(name);
        packages
            .entry(key.clone())
            .or_insert_with(|| PackageRecord::new(key, Some(version.to_owned()), Origin::FrozenListing));
    }

    packages
}

fn parse_freeze_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') || line.starts_with('-') {
        return None;
    }
    if line.matches("==").count() != 1 {
        return None;
    }

    let (name, version) = line.split_once("==")?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, version))
}

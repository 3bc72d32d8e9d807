/// 空のディレクトリ名を入力した際に表示するメッセージ。
pub const EMPTY_DIR_NAME_MESSAGE: &str = "⚠️  directory name must not be null!";

/// ディレクトリ名バリデーション: 空文字列のみ禁止
///
/// 空でない文字列はそのまま受け付ける。
///
/// # Errors
/// 名前が空の場合。
pub fn validate_dir_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err(EMPTY_DIR_NAME_MESSAGE.into());
    }
    Ok(())
}

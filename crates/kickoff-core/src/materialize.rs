use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::template::TemplateRenderer;

/// ステージングツリーをレンダリングしてプロジェクトディレクトリに書き出す。
pub struct ProjectMaterializer {
    renderer: TemplateRenderer,
}

impl ProjectMaterializer {
    pub fn new(renderer: TemplateRenderer) -> Self {
        Self { renderer }
    }

    /// `staging` 以下の全ファイルを `destination` の同じ相対パスへ書き出す。
    ///
    /// 処理の流れ:
    /// 1. ステージングを深さ優先で走査 (シンボリックリンクは辿る)
    /// 2. ディレクトリ以外はすべてファイルとして読み込み、レンダリング
    /// 3. 親ディレクトリを作成して書き込み
    /// 4. 走査完了後にステージングを削除
    ///
    /// 途中で失敗した場合はそこで中断し、書き込み済みのファイルは残る。
    /// ステージングが宛先の直下にある場合、テンプレート直下の同名エントリは
    /// ステージング自身と重なるため書き出さない。
    ///
    /// # Returns
    /// 書き出したファイルの相対パス一覧 (走査順)
    pub fn materialize(&mut self, staging: &Path, destination: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        let shadowed = staging
            .file_name()
            .filter(|_| staging.parent() == Some(destination));

        let walker = WalkDir::new(staging)
            .follow_links(true)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 1 && Some(e.file_name()) == shadowed {
                    warn!(
                        entry = %e.path().display(),
                        "skipping entry that shadows the staging directory"
                    );
                    return false;
                }
                e.file_name() != ".git"
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| staging.to_path_buf());
                let message = e.to_string();
                let source = e.into_io_error().unwrap_or_else(|| io::Error::other(message));
                Error::io("failed to walk", path, source)
            })?;

            if entry.file_type().is_dir() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(staging)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| PathBuf::from(entry.file_name()));
            let output_path = destination.join(&relative);

            let bytes = fs::read(entry.path())
                .map_err(|e| Error::io("failed to read", entry.path(), e))?;
            let rendered = self.renderer.render_bytes(&relative, bytes)?;

            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::io("failed to create", parent, e))?;
            }
            fs::write(&output_path, rendered)
                .map_err(|e| Error::io("failed to write", &output_path, e))?;

            debug!(file = %relative.display(), "wrote");
            written.push(relative);
        }

        fs::remove_dir_all(staging).map_err(|e| Error::io("failed to remove", staging, e))?;
        Ok(written)
    }
}

/// ステージングディレクトリを確実に片付けるためのガード。
///
/// 生成時にまだ存在しないパスだけを削除対象にする。既存のディレクトリには触らない。
/// 成功時は [`StagingGuard::disarm`]、失敗経路では [`StagingGuard::remove`] を呼ぶ。
/// どちらも呼ばれずに drop された場合も削除を試みる。
#[derive(Debug)]
pub struct StagingGuard {
    path: PathBuf,
    armed: bool,
}

impl StagingGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let armed = !path.exists();
        Self { path, armed }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn disarm(mut self) {
        self.armed = false;
    }

    /// 削除対象であればステージングを削除する。
    ///
    /// # Errors
    /// ディレクトリの削除に失敗した場合。
    pub fn remove(mut self) -> io::Result<()> {
        let armed = std::mem::replace(&mut self.armed, false);
        if !armed || !self.path.exists() {
            return Ok(());
        }
        fs::remove_dir_all(&self.path)?;
        debug!(path = %self.path.display(), "removed staging directory");
        Ok(())
    }
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        if !self.armed || !self.path.exists() {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staging directory"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove staging directory"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Syntax, TemplateContext};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn materializer(dir_name: &str) -> ProjectMaterializer {
        ProjectMaterializer::new(TemplateRenderer::new(
            Syntax::Ejs,
            TemplateContext::new(dir_name),
        ))
    }

    /// 3 ディレクトリに 4 ファイルを置いたステージングを作る。
    fn staged_tree(root: &Path) -> PathBuf {
        let staging = root.join("my-app").join(".tmp");
        fs::create_dir_all(staging.join("src/components")).unwrap();
        fs::create_dir_all(staging.join("public")).unwrap();
        fs::write(
            staging.join("package.json"),
            "{ \"name\": \"<%= dirName %>\" }",
        )
        .unwrap();
        fs::write(staging.join("src/main.js"), "// <%= dirName %> entry\n").unwrap();
        fs::write(
            staging.join("src/components/App.vue"),
            "<template><h1>{{ title }}</h1></template>\n",
        )
        .unwrap();
        fs::write(staging.join("public/favicon.ico"), [0u8, 1, 2, 3, 255]).unwrap();
        staging
    }

    #[test]
    fn test_materialize_mirrors_every_file() {
        let tmp = TempDir::new().unwrap();
        let staging = staged_tree(tmp.path());
        let destination = tmp.path().join("my-app");

        let written = materializer("my-app")
            .materialize(&staging, &destination)
            .unwrap();

        let mut names: Vec<String> = written
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "package.json",
                "public/favicon.ico",
                "src/components/App.vue",
                "src/main.js",
            ]
        );
        for name in &names {
            assert!(destination.join(name).is_file(), "{name} missing");
        }
    }

    #[test]
    fn test_materialize_substitutes_token() {
        let tmp = TempDir::new().unwrap();
        let staging = staged_tree(tmp.path());
        let destination = tmp.path().join("my-app");

        materializer("my-app")
            .materialize(&staging, &destination)
            .unwrap();

        let pkg = fs::read_to_string(destination.join("package.json")).unwrap();
        assert_eq!(pkg, "{ \"name\": \"my-app\" }");
        let main = fs::read_to_string(destination.join("src/main.js")).unwrap();
        assert_eq!(main, "// my-app entry\n");
        let app = fs::read_to_string(destination.join("src/components/App.vue")).unwrap();
        assert_eq!(app, "<template><h1>{{ title }}</h1></template>\n");
        let icon = fs::read(destination.join("public/favicon.ico")).unwrap();
        assert_eq!(icon, vec![0u8, 1, 2, 3, 255]);
    }

    #[test]
    fn test_materialize_removes_staging() {
        let tmp = TempDir::new().unwrap();
        let staging = staged_tree(tmp.path());
        let destination = tmp.path().join("my-app");

        materializer("my-app")
            .materialize(&staging, &destination)
            .unwrap();

        assert!(!staging.exists());
        assert!(destination.exists());
    }

    #[test]
    fn test_materialize_skips_empty_directories_and_git() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("app/.tmp");
        fs::create_dir_all(staging.join("empty")).unwrap();
        fs::create_dir_all(staging.join(".git")).unwrap();
        fs::write(staging.join(".git/HEAD"), "ref").unwrap();
        fs::write(staging.join("index.html"), "<%= dirName %>").unwrap();
        let destination = tmp.path().join("app");

        let written = materializer("app").materialize(&staging, &destination).unwrap();

        assert_eq!(written, vec![PathBuf::from("index.html")]);
        assert!(!destination.join("empty").exists());
        assert!(!destination.join(".git").exists());
    }

    #[test]
    fn test_materialize_render_error_leaves_partial_output() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("app/.tmp");
        fs::create_dir_all(&staging).unwrap();
        // 名前順で a.txt が先に処理される
        fs::write(staging.join("a.txt"), "ok <%= dirName %>").unwrap();
        fs::write(staging.join("b.txt"), "<%= missing %>").unwrap();
        let destination = tmp.path().join("app");

        let err = materializer("app")
            .materialize(&staging, &destination)
            .unwrap_err();

        assert!(matches!(err, Error::Render { .. }));
        assert!(destination.join("a.txt").is_file());
        assert!(!destination.join("b.txt").exists());
        // 失敗時のステージング削除は呼び出し側 (StagingGuard) の責務
        assert!(staging.exists());
    }

    #[test]
    fn test_materialize_skips_entry_named_like_staging() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("app/.tmp");
        fs::create_dir_all(staging.join(".tmp")).unwrap();
        fs::create_dir_all(staging.join("src/.tmp")).unwrap();
        fs::write(staging.join(".tmp/cache.txt"), "cache").unwrap();
        fs::write(staging.join("src/.tmp/keep.txt"), "keep").unwrap();
        fs::write(staging.join("index.html"), "<%= dirName %>").unwrap();
        let destination = tmp.path().join("app");

        let written = materializer("app").materialize(&staging, &destination).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(names, vec!["index.html", "src/.tmp/keep.txt"]);
        assert!(!staging.exists());
        assert!(destination.join("src/.tmp/keep.txt").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_materialize_follows_symlinks() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join("app/.tmp");
        fs::create_dir_all(&staging).unwrap();
        let outside = tmp.path().join("shared.txt");
        fs::write(&outside, "shared by <%= dirName %>").unwrap();
        std::os::unix::fs::symlink(&outside, staging.join("link.txt")).unwrap();
        let destination = tmp.path().join("app");

        materializer("app").materialize(&staging, &destination).unwrap();

        let content = fs::read_to_string(destination.join("link.txt")).unwrap();
        assert_eq!(content, "shared by app");
    }

    #[test]
    fn test_staging_guard_removes_on_drop() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join(".tmp");
        {
            let guard = StagingGuard::new(&staging);
            assert!(guard.is_armed());
            fs::create_dir_all(staging.join("nested")).unwrap();
        }
        assert!(!staging.exists());
    }

    #[test]
    fn test_staging_guard_disarmed_keeps_directory() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join(".tmp");
        let guard = StagingGuard::new(&staging);
        fs::create_dir_all(&staging).unwrap();
        assert_eq!(guard.path(), staging.as_path());
        guard.disarm();
        assert!(staging.exists());
    }

    #[test]
    fn test_staging_guard_remove() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join(".tmp");
        let guard = StagingGuard::new(&staging);
        fs::create_dir_all(staging.join("src")).unwrap();
        fs::write(staging.join("src/main.js"), "x").unwrap();
        guard.remove().unwrap();
        assert!(!staging.exists());
    }

    #[test]
    fn test_staging_guard_leaves_preexisting_directory() {
        let tmp = TempDir::new().unwrap();
        let staging = tmp.path().join(".tmp");
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("notes.txt"), "mine").unwrap();

        let guard = StagingGuard::new(&staging);
        assert!(!guard.is_armed());
        guard.remove().unwrap();
        {
            let _dropped = StagingGuard::new(&staging);
        }

        assert_eq!(fs::read_to_string(staging.join("notes.txt")).unwrap(), "mine");
    }
}

//! Shared test helpers for sync integration tests
//!
//! Provides an in-memory remote store with a user tree (`user_4`, owned by
//! Jane Doe) and a community tree (`community_2`, "Lab"), a presenter that
//! records what it is shown, and a confirmation that records questions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail};
use midsync_core::domain::{
    Bitstream, Checksum, CommunityInfo, Credentials, DiffReport, Email, FolderDetail,
    FolderId, FolderListing, FolderParent, FolderRef, ItemDetail, ItemId, ItemRef,
    MirrorSummary, PrincipalId, RemoteLocator, Revision, ServerPath, Session, SyncMode,
    SyncSettings, UserInfo,
};
use midsync_core::ports::{
    is_hidden, IConfirmation, ILocalFileSystem, IRemoteStore, IReportPresenter, LocalLevel,
    ReportStage,
};
use midsync_sync::driver::SyncDriver;
use midsync_sync::filesystem::LocalFileSystemAdapter;

pub const ENDPOINT: &str = "http://midas.test";
pub const EMAIL: &str = "jane@example.org";
pub const API_KEY: &str = "good-key";

/// Root folder of Jane Doe's user tree
pub const USER_ROOT: &str = "3";
/// Root folder of the "Lab" community tree
pub const COMMUNITY_ROOT: &str = "8";

pub fn fid(id: &str) -> FolderId {
    FolderId::new(id).unwrap()
}

pub fn iid(id: &str) -> ItemId {
    ItemId::new(id).unwrap()
}

pub fn session() -> Session {
    Session::new("fake-token", Email::new(EMAIL).unwrap())
}

pub fn folder_locator(id: &FolderId) -> RemoteLocator {
    RemoteLocator::folder(ENDPOINT, id)
}

pub fn item_locator(id: &ItemId) -> RemoteLocator {
    RemoteLocator::item(ENDPOINT, id)
}

pub fn settings(mode: SyncMode, local_root: &Path, root: &FolderId) -> SyncSettings {
    settings_with_key(mode, local_root, root, API_KEY)
}

pub fn settings_with_key(mode: SyncMode, local_root: &Path, root: &FolderId, key: &str) -> SyncSettings {
    SyncSettings::new(
        mode,
        local_root,
        ENDPOINT,
        Credentials::new(Email::new(EMAIL).unwrap(), key).unwrap(),
        root.clone(),
    )
    .unwrap()
}

/// Writes `content` at `relative` below `root`, creating parents
pub fn write_file(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// In-memory remote store
// ============================================================================

struct FakeFolder {
    name: String,
    parent: FolderParent,
}

struct FakeItem {
    name: String,
    folder: FolderId,
    /// Content of each revision's bitstream; `None` is a revision without one
    revisions: Vec<Option<Vec<u8>>>,
}

#[derive(Default)]
struct State {
    folders: BTreeMap<FolderId, FakeFolder>,
    items: BTreeMap<ItemId, FakeItem>,
    users: Vec<UserInfo>,
    communities: Vec<CommunityInfo>,
    next_id: u64,
    logins: usize,
    mutations: usize,
    failing_details: Vec<ItemId>,
    failing_listings: Vec<FolderId>,
    failing_uploads: Vec<String>,
}

impl State {
    fn allocate(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn children(&self, folder: &FolderId) -> (Vec<(FolderId, String)>, Vec<(ItemId, String)>) {
        let folders = self
            .folders
            .iter()
            .filter(|(_, f)| f.parent == FolderParent::Folder(folder.clone()))
            .map(|(id, f)| (id.clone(), f.name.clone()))
            .collect();
        let items = self
            .items
            .iter()
            .filter(|(_, i)| &i.folder == folder)
            .map(|(id, i)| (id.clone(), i.name.clone()))
            .collect();
        (folders, items)
    }

    fn add_folder(&mut self, parent: FolderParent, name: &str) -> FolderId {
        let id = FolderId::new(self.allocate()).unwrap();
        self.folders.insert(
            id.clone(),
            FakeFolder {
                name: name.to_string(),
                parent,
            },
        );
        id
    }

    fn add_item(&mut self, folder: &FolderId, name: &str, revisions: Vec<Option<Vec<u8>>>) -> ItemId {
        let id = ItemId::new(self.allocate()).unwrap();
        self.items.insert(
            id.clone(),
            FakeItem {
                name: name.to_string(),
                folder: folder.clone(),
                revisions,
            },
        );
        id
    }

    fn resolve(&self, path: &ServerPath) -> anyhow::Result<FolderId> {
        let mut segments = path.as_str().trim_start_matches('/').split('/');
        let kind = segments.next().unwrap_or_default();
        let principal = segments.next().ok_or_else(|| anyhow!("no principal in {path}"))?;

        let mut current = match kind {
            "users" => self
                .users
                .iter()
                .find(|u| u.display_name() == principal)
                .and_then(|u| u.root_folder_id.clone()),
            "communities" => self
                .communities
                .iter()
                .find(|c| c.name == principal)
                .and_then(|c| c.root_folder_id.clone()),
            _ => None,
        }
        .ok_or_else(|| anyhow!("unknown principal in {path}"))?;

        for segment in segments {
            let (folders, _) = self.children(&current);
            current = folders
                .into_iter()
                .find(|(_, name)| name == segment)
                .map(|(id, _)| id)
                .ok_or_else(|| anyhow!("no folder {segment} in {path}"))?;
        }
        Ok(current)
    }

    fn remove_folder(&mut self, id: &FolderId) {
        let (folders, items) = self.children(id);
        for (child, _) in folders {
            self.remove_folder(&child);
        }
        for (item, _) in items {
            self.items.remove(&item);
        }
        self.folders.remove(id);
    }

    fn import_dir(&mut self, dir: &Path, parent: &FolderId) -> anyhow::Result<()> {
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow!("bad directory name"))?;
        let folder = self.add_folder(FolderParent::Folder(parent.clone()), name);

        let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
        entries.sort_by_key(|e| e.file_name());
        for entry in entries {
            let name = entry.file_name().to_string_lossy().into_owned();
            if is_hidden(&name) {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                self.import_dir(&path, &folder)?;
            } else {
                let content = std::fs::read(&path)?;
                self.add_item(&folder, &name, vec![Some(content)]);
            }
        }
        Ok(())
    }

    fn export_dir(&self, folder: &FolderId, dir: &Path) -> anyhow::Result<()> {
        let (folders, items) = self.children(folder);
        for (id, name) in folders {
            let child = dir.join(&name);
            std::fs::create_dir(&child)?;
            self.export_dir(&id, &child)?;
        }
        for (id, name) in items {
            let content = self.items[&id]
                .revisions
                .last()
                .cloned()
                .flatten()
                .unwrap_or_default();
            std::fs::write(dir.join(&name), content)?;
        }
        Ok(())
    }
}

/// Remote store kept entirely in memory
pub struct FakeRemote {
    state: Mutex<State>,
}

impl FakeRemote {
    /// A store with Jane Doe's tree rooted at folder 3 and the "Lab"
    /// community tree rooted at folder 8
    pub fn new() -> Arc<Self> {
        let mut state = State {
            next_id: 100,
            ..State::default()
        };
        state.folders.insert(
            fid(USER_ROOT),
            FakeFolder {
                name: "user_4".to_string(),
                parent: FolderParent::UserRoot,
            },
        );
        state.folders.insert(
            fid(COMMUNITY_ROOT),
            FakeFolder {
                name: "community_2".to_string(),
                parent: FolderParent::CommunityRoot,
            },
        );
        state.users.push(UserInfo {
            id: PrincipalId::new("4").unwrap(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: Some(Email::new(EMAIL).unwrap()),
            root_folder_id: Some(fid(USER_ROOT)),
        });
        state.users.push(UserInfo {
            id: PrincipalId::new("5").unwrap(),
            first_name: "John".to_string(),
            last_name: "Roe".to_string(),
            email: Some(Email::new("john@example.org").unwrap()),
            root_folder_id: Some(fid("6")),
        });
        state.folders.insert(
            fid("6"),
            FakeFolder {
                name: "user_5".to_string(),
                parent: FolderParent::UserRoot,
            },
        );
        state.communities.push(CommunityInfo {
            id: PrincipalId::new("2").unwrap(),
            name: "Lab".to_string(),
            root_folder_id: Some(fid(COMMUNITY_ROOT)),
        });

        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    pub fn add_folder(&self, parent: &FolderId, name: &str) -> FolderId {
        self.state
            .lock()
            .unwrap()
            .add_folder(FolderParent::Folder(parent.clone()), name)
    }

    /// Adds a folder with an arbitrary parent marker
    pub fn add_folder_with_parent(&self, parent: FolderParent, name: &str) -> FolderId {
        self.state.lock().unwrap().add_folder(parent, name)
    }

    /// Adds an item whose latest revision holds `content`
    pub fn add_item(&self, folder: &FolderId, name: &str, content: &[u8]) -> ItemId {
        self.state
            .lock()
            .unwrap()
            .add_item(folder, name, vec![Some(content.to_vec())])
    }

    /// Adds an item with the given revision history
    pub fn add_item_with_revisions(
        &self,
        folder: &FolderId,
        name: &str,
        revisions: Vec<Option<Vec<u8>>>,
    ) -> ItemId {
        self.state.lock().unwrap().add_item(folder, name, revisions)
    }

    pub fn fail_item_detail(&self, item: &ItemId) {
        self.state.lock().unwrap().failing_details.push(item.clone());
    }

    pub fn fail_listing(&self, folder: &FolderId) {
        self.state.lock().unwrap().failing_listings.push(folder.clone());
    }

    /// Makes uploads of files named `name` fail
    pub fn fail_uploads_of(&self, name: &str) {
        self.state.lock().unwrap().failing_uploads.push(name.to_string());
    }

    pub fn logins(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    /// Number of mutating calls received
    pub fn mutations(&self) -> usize {
        self.state.lock().unwrap().mutations
    }

    pub fn folder_exists(&self, id: &FolderId) -> bool {
        self.state.lock().unwrap().folders.contains_key(id)
    }

    pub fn item_exists(&self, id: &ItemId) -> bool {
        self.state.lock().unwrap().items.contains_key(id)
    }

    pub fn revision_count(&self, id: &ItemId) -> usize {
        self.state.lock().unwrap().items[id].revisions.len()
    }

    /// Id of the child folder `name` of `parent`
    pub fn child_folder(&self, parent: &FolderId, name: &str) -> Option<FolderId> {
        let state = self.state.lock().unwrap();
        let (folders, _) = state.children(parent);
        folders.into_iter().find(|(_, n)| n == name).map(|(id, _)| id)
    }

    /// Id of the child item `name` of `parent`
    pub fn child_item(&self, parent: &FolderId, name: &str) -> Option<ItemId> {
        let state = self.state.lock().unwrap();
        let (_, items) = state.children(parent);
        items.into_iter().find(|(_, n)| n == name).map(|(id, _)| id)
    }

    fn upload(&self, item_id: &ItemId, local_path: &Path) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if state.failing_uploads.iter().any(|f| f == name) {
            bail!("simulated upload failure for {name}");
        }
        let content = std::fs::read(local_path)?;
        state
            .items
            .get_mut(item_id)
            .ok_or_else(|| anyhow!("no item {item_id}"))?
            .revisions
            .push(Some(content));
        Ok(())
    }
}

#[async_trait::async_trait]
impl IRemoteStore for FakeRemote {
    async fn authenticate(&self, credentials: &Credentials) -> anyhow::Result<Session> {
        let mut state = self.state.lock().unwrap();
        state.logins += 1;
        if credentials.api_key != API_KEY {
            bail!("Unauthorized: bad API key");
        }
        Ok(Session::new("fake-token", credentials.email.clone()))
    }

    async fn list_children(&self, _session: &Session, folder_id: &FolderId) -> anyhow::Result<FolderListing> {
        let state = self.state.lock().unwrap();
        if state.failing_listings.contains(folder_id) {
            bail!("simulated listing failure");
        }
        if !state.folders.contains_key(folder_id) {
            bail!("Not found: folder {folder_id}");
        }
        let (folders, items) = state.children(folder_id);
        Ok(FolderListing::from_children(
            folders.into_iter().map(|(id, name)| FolderRef { id, name }),
            items.into_iter().map(|(id, name)| ItemRef { id, name }),
        ))
    }

    async fn get_item_detail(&self, _session: &Session, item_id: &ItemId) -> anyhow::Result<ItemDetail> {
        let state = self.state.lock().unwrap();
        if state.failing_details.contains(item_id) {
            bail!("simulated detail failure");
        }
        let item = state.items.get(item_id).ok_or_else(|| anyhow!("no item {item_id}"))?;
        Ok(ItemDetail {
            id: item_id.clone(),
            name: item.name.clone(),
            revisions: item
                .revisions
                .iter()
                .map(|content| Revision {
                    bitstreams: content
                        .iter()
                        .map(|bytes| Bitstream {
                            name: item.name.clone(),
                            checksum: Some(Checksum::from_bytes(&md5::compute(bytes).0)),
                            size: Some(bytes.len() as u64),
                        })
                        .collect(),
                })
                .collect(),
        })
    }

    async fn get_folder_detail(&self, _session: &Session, folder_id: &FolderId) -> anyhow::Result<FolderDetail> {
        let state = self.state.lock().unwrap();
        let folder = state
            .folders
            .get(folder_id)
            .ok_or_else(|| anyhow!("Not found: folder {folder_id}"))?;
        Ok(FolderDetail {
            id: folder_id.clone(),
            name: folder.name.clone(),
            parent: folder.parent.clone(),
        })
    }

    async fn create_item(&self, _session: &Session, name: &str, parent: &FolderId) -> anyhow::Result<ItemId> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        if !state.folders.contains_key(parent) {
            bail!("Not found: folder {parent}");
        }
        Ok(state.add_item(parent, name, Vec::new()))
    }

    async fn upload_bitstream(&self, _session: &Session, item_id: &ItemId, local_path: &Path) -> anyhow::Result<()> {
        self.upload(item_id, local_path)
    }

    async fn upload_revision(&self, _session: &Session, item_id: &ItemId, local_path: &Path) -> anyhow::Result<()> {
        self.upload(item_id, local_path)
    }

    async fn upload_folder(&self, _session: &Session, local_dir: &Path, destination: &ServerPath) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        let parent = state.resolve(destination)?;
        state.import_dir(local_dir, &parent)
    }

    async fn download_folder(&self, _session: &Session, source: &ServerPath, local_dir: &Path) -> anyhow::Result<()> {
        let state = self.state.lock().unwrap();
        let folder = state.resolve(source)?;
        state.export_dir(&folder, local_dir)
    }

    async fn delete_folder(&self, _session: &Session, folder_id: &FolderId) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        state.remove_folder(folder_id);
        Ok(())
    }

    async fn delete_item(&self, _session: &Session, item_id: &ItemId) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        state.items.remove(item_id);
        Ok(())
    }

    async fn get_user(&self, _session: &Session, user_id: &PrincipalId) -> anyhow::Result<UserInfo> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| &u.id == user_id)
            .cloned()
            .ok_or_else(|| anyhow!("no user {user_id}"))
    }

    async fn find_user_by_email(&self, _session: &Session, email: &Email) -> anyhow::Result<UserInfo> {
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.email.as_ref() == Some(email))
            .cloned()
            .ok_or_else(|| anyhow!("no user {email}"))
    }

    async fn get_community(&self, _session: &Session, community_id: &PrincipalId) -> anyhow::Result<CommunityInfo> {
        let state = self.state.lock().unwrap();
        state
            .communities
            .iter()
            .find(|c| &c.id == community_id)
            .cloned()
            .ok_or_else(|| anyhow!("no community {community_id}"))
    }
}

// ============================================================================
// Presenter and confirmation doubles
// ============================================================================

/// Everything a presenter was shown, in order
#[derive(Debug, Clone)]
pub enum Presented {
    Report(ReportStage, DiffReport),
    Summary(MirrorSummary),
    Notice(String),
}

#[derive(Default)]
pub struct RecordingPresenter {
    shown: Mutex<Vec<Presented>>,
}

impl RecordingPresenter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shown(&self) -> Vec<Presented> {
        self.shown.lock().unwrap().clone()
    }

    pub fn stages(&self) -> Vec<ReportStage> {
        self.shown()
            .into_iter()
            .filter_map(|p| match p {
                Presented::Report(stage, _) => Some(stage),
                _ => None,
            })
            .collect()
    }
}

impl IReportPresenter for RecordingPresenter {
    fn present_report(&self, stage: ReportStage, _local_root: &Path, _remote_root: &RemoteLocator, report: &DiffReport) {
        self.shown
            .lock()
            .unwrap()
            .push(Presented::Report(stage, report.clone()));
    }

    fn present_summary(&self, summary: &MirrorSummary) {
        self.shown.lock().unwrap().push(Presented::Summary(summary.clone()));
    }

    fn present_notice(&self, message: &str) {
        self.shown.lock().unwrap().push(Presented::Notice(message.to_string()));
    }
}

/// Fixed answer that remembers every question
pub struct RecordingConfirmation {
    answer: bool,
    questions: Mutex<Vec<String>>,
}

impl RecordingConfirmation {
    pub fn new(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            answer,
            questions: Mutex::new(Vec::new()),
        })
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl IConfirmation for RecordingConfirmation {
    async fn confirm(&self, question: &str) -> anyhow::Result<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answer)
    }
}

/// Real local filesystem whose named files cannot be read
pub struct UnreadableFiles {
    inner: LocalFileSystemAdapter,
    names: Vec<String>,
}

impl UnreadableFiles {
    pub fn new(names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalFileSystemAdapter::new(),
            names: names.iter().map(|n| n.to_string()).collect(),
        })
    }
}

#[async_trait::async_trait]
impl ILocalFileSystem for UnreadableFiles {
    async fn list_level(&self, dir: &Path) -> anyhow::Result<LocalLevel> {
        self.inner.list_level(dir).await
    }

    async fn compute_checksum(&self, path: &Path) -> anyhow::Result<Checksum> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.names.iter().any(|n| n == name) {
            bail!("Permission denied (os error 13)");
        }
        self.inner.compute_checksum(path).await
    }

    async fn is_empty_dir(&self, dir: &Path) -> anyhow::Result<bool> {
        self.inner.is_empty_dir(dir).await
    }
}

/// A driver over `remote` with the real local filesystem adapter
pub fn driver(
    remote: &Arc<FakeRemote>,
    confirmation: Arc<dyn IConfirmation>,
    presenter: &Arc<RecordingPresenter>,
) -> SyncDriver {
    SyncDriver::new(
        remote.clone(),
        Arc::new(LocalFileSystemAdapter::new()),
        confirmation,
        presenter.clone(),
    )
}

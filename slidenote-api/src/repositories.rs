use crate::endpoints::{
    FileFilter,
    account::{GetUserData, ModifySubscription, SubscriptionAction},
    auth::VerifyIdToken,
    conversations::{Chat, DeleteConversation, GetConversation},
    files::{DeleteFile, ListFiles, UploadFile},
};

pub struct AuthRepository;

impl AuthRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn verify(&self) -> VerifyIdToken {
        VerifyIdToken::new()
    }
}

pub struct AccountRepository;

impl AccountRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn get(&self) -> GetUserData {
        GetUserData::new()
    }

    pub fn modify_subscription(&self, action: SubscriptionAction) -> ModifySubscription {
        ModifySubscription::new(action)
    }
}

pub struct FileRepository;

impl FileRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self, filter: impl Into<FileFilter>) -> ListFiles {
        ListFiles::new(filter)
    }

    pub fn upload(&self, file_name: impl Into<String>, bytes: Vec<u8>) -> UploadFile {
        UploadFile::new(file_name, bytes)
    }

    pub fn delete(&self, fid: impl Into<String>) -> DeleteFile {
        DeleteFile::new(fid)
    }
}

#[derive(Default)]
pub struct ConversationRepository {
    fid: String,
}

impl ConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, fid: impl Into<String>) -> Self {
        self.fid = fid.into();
        self
    }

    pub fn get(&self, slide_id: usize) -> GetConversation {
        GetConversation::new(self.fid.clone(), slide_id)
    }

    pub fn chat(&self, slide_id: usize) -> Chat {
        Chat::new(self.fid.clone(), slide_id)
    }

    pub fn delete(&self, slide_id: usize) -> DeleteConversation {
        DeleteConversation::new(self.fid.clone(), slide_id)
    }
}

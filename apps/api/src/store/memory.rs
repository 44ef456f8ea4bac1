//! In-process store used by the test suites.
//!
//! All state sits behind one mutex, so every operation (the claim included)
//! is atomic with respect to every other.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::applicant::Applicant;
use crate::models::folder::Folder;
use crate::models::job::Job;
use crate::models::report::Report;
use crate::models::resume::{Resume, ResumeStatus};
use crate::store::{ReportKey, Store, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    // Vec keeps upload order, which is the claim order.
    resumes: Vec<Resume>,
    folders: HashMap<Uuid, Folder>,
    jobs: HashMap<Uuid, Job>,
    reports: Vec<Report>,
    applicants: Vec<Applicant>,
    faults: Faults,
}

/// Injected failures, consumed one per call.
#[derive(Default)]
struct Faults {
    claim_errors: u32,
    save_resume_errors: u32,
    add_processed_errors: u32,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn injected() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

fn report_key(report: &Report) -> ReportKey {
    ReportKey {
        job_id: report.job_id,
        folder_id: report.folder_id,
        user_id: report.user_id,
        priority_hash: report.priority_hash.clone(),
    }
}

fn take_fault(counter: &mut u32) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store mutex poisoned")
    }

    pub fn fail_next_claims(&self, n: u32) {
        self.lock().faults.claim_errors = n;
    }

    pub fn fail_next_resume_saves(&self, n: u32) {
        self.lock().faults.save_resume_errors = n;
    }

    pub fn fail_next_processed_appends(&self, n: u32) {
        self.lock().faults.add_processed_errors = n;
    }

    pub fn resume_count(&self) -> usize {
        self.lock().resumes.len()
    }

    pub fn applicant_count(&self) -> usize {
        self.lock().applicants.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_resume(&self, resume: &Resume) -> StoreResult<()> {
        self.lock().resumes.push(resume.clone());
        Ok(())
    }

    async fn get_resume(&self, id: Uuid) -> StoreResult<Option<Resume>> {
        Ok(self.lock().resumes.iter().find(|r| r.id == id).cloned())
    }

    async fn get_resumes(&self, ids: &[Uuid]) -> StoreResult<Vec<Resume>> {
        let inner = self.lock();
        Ok(inner
            .resumes
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }

    async fn resumes_in_folder(&self, folder_id: Uuid) -> StoreResult<Vec<Resume>> {
        let inner = self.lock();
        Ok(inner
            .resumes
            .iter()
            .filter(|r| r.folder_id == folder_id)
            .cloned()
            .collect())
    }

    async fn claim_next_pending_resume(&self) -> StoreResult<Option<Resume>> {
        let mut inner = self.lock();
        if take_fault(&mut inner.faults.claim_errors) {
            return Err(injected());
        }
        Ok(inner
            .resumes
            .iter_mut()
            .find(|r| r.status == ResumeStatus::Pending)
            .map(|r| {
                r.status = ResumeStatus::Processing;
                r.clone()
            }))
    }

    async fn save_resume(&self, resume: &Resume) -> StoreResult<()> {
        let mut inner = self.lock();
        if take_fault(&mut inner.faults.save_resume_errors) {
            return Err(injected());
        }
        let slot = inner
            .resumes
            .iter_mut()
            .find(|r| r.id == resume.id)
            .ok_or_else(|| StoreError::NotFound(format!("Resume {}", resume.id)))?;
        *slot = resume.clone();
        Ok(())
    }

    async fn delete_resume(&self, id: Uuid) -> StoreResult<()> {
        self.lock().resumes.retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_resumes_in_folder(&self, folder_id: Uuid) -> StoreResult<u64> {
        let mut inner = self.lock();
        let before = inner.resumes.len();
        inner.resumes.retain(|r| r.folder_id != folder_id);
        Ok((before - inner.resumes.len()) as u64)
    }

    async fn insert_folder(&self, folder: &Folder) -> StoreResult<()> {
        self.lock().folders.insert(folder.id, folder.clone());
        Ok(())
    }

    async fn get_folder(&self, id: Uuid) -> StoreResult<Option<Folder>> {
        Ok(self.lock().folders.get(&id).cloned())
    }

    async fn folders_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Folder>> {
        let inner = self.lock();
        let mut folders: Vec<Folder> = inner
            .folders
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(folders)
    }

    async fn rename_folder(&self, id: Uuid, title: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        let folder = inner
            .folders
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Folder {id}")))?;
        folder.title = title.to_string();
        Ok(())
    }

    async fn push_total_file(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()> {
        let mut inner = self.lock();
        let folder = inner
            .folders
            .get_mut(&folder_id)
            .ok_or_else(|| StoreError::NotFound(format!("Folder {folder_id}")))?;
        folder.total_files.push(resume_id);
        Ok(())
    }

    async fn add_processed_file(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()> {
        let mut inner = self.lock();
        if take_fault(&mut inner.faults.add_processed_errors) {
            return Err(injected());
        }
        // A folder deleted mid-run is not an error for the worker.
        if let Some(folder) = inner.folders.get_mut(&folder_id) {
            if !folder.processed_files.contains(&resume_id) {
                folder.processed_files.push(resume_id);
            }
        }
        Ok(())
    }

    async fn pull_resume_from_folder(&self, folder_id: Uuid, resume_id: Uuid) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(folder) = inner.folders.get_mut(&folder_id) {
            folder.total_files.retain(|id| *id != resume_id);
            folder.processed_files.retain(|id| *id != resume_id);
        }
        Ok(())
    }

    async fn delete_folder(&self, id: Uuid) -> StoreResult<()> {
        self.lock().folders.remove(&id);
        Ok(())
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        self.lock().jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.lock().jobs.get(&id).cloned())
    }

    async fn jobs_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Job>> {
        let inner = self.lock();
        let mut jobs: Vec<Job> = inner
            .jobs
            .values()
            .filter(|j| j.created_by == user_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn save_job(&self, job: &Job) -> StoreResult<()> {
        let mut inner = self.lock();
        let slot = inner
            .jobs
            .get_mut(&job.id)
            .ok_or_else(|| StoreError::NotFound(format!("Job {}", job.id)))?;
        let reports = std::mem::take(&mut slot.reports);
        *slot = Job {
            reports,
            ..job.clone()
        };
        Ok(())
    }

    async fn push_job_report(&self, job_id: Uuid, report_id: Uuid) -> StoreResult<()> {
        let mut inner = self.lock();
        let job = inner
            .jobs
            .get_mut(&job_id)
            .ok_or_else(|| StoreError::NotFound(format!("Job {job_id}")))?;
        job.reports.push(report_id);
        Ok(())
    }

    async fn pull_job_report(&self, job_id: Uuid, report_id: Uuid) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(job) = inner.jobs.get_mut(&job_id) {
            job.reports.retain(|id| *id != report_id);
        }
        Ok(())
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<()> {
        self.lock().jobs.remove(&id);
        Ok(())
    }

    async fn find_report(&self, key: &ReportKey) -> StoreResult<Option<Report>> {
        let inner = self.lock();
        Ok(inner
            .reports
            .iter()
            .find(|r| report_key(r) == *key)
            .cloned())
    }

    async fn insert_report(&self, report: &Report) -> StoreResult<()> {
        let mut inner = self.lock();
        let key = report_key(report);
        if inner.reports.iter().any(|r| report_key(r) == key) {
            return Err(StoreError::Conflict(
                "Report already exists for this job, folder and priority".to_string(),
            ));
        }
        inner.reports.push(report.clone());
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> StoreResult<Option<Report>> {
        Ok(self.lock().reports.iter().find(|r| r.id == id).cloned())
    }

    async fn save_report(&self, report: &Report) -> StoreResult<()> {
        let mut inner = self.lock();
        let slot = inner
            .reports
            .iter_mut()
            .find(|r| r.id == report.id)
            .ok_or_else(|| StoreError::NotFound(format!("Report {}", report.id)))?;
        slot.status = report.status;
        slot.results = report.results.clone();
        Ok(())
    }

    async fn reports_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Report>> {
        let inner = self.lock();
        Ok(inner
            .reports
            .iter()
            .rev()
            .filter(|r| r.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn reports_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Report>> {
        let inner = self.lock();
        Ok(inner
            .reports
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_report(&self, id: Uuid) -> StoreResult<()> {
        self.lock().reports.retain(|r| r.id != id);
        Ok(())
    }

    async fn insert_applicants(&self, applicants: &[Applicant]) -> StoreResult<()> {
        self.lock().applicants.extend_from_slice(applicants);
        Ok(())
    }

    async fn get_applicant(&self, id: Uuid) -> StoreResult<Option<Applicant>> {
        Ok(self.lock().applicants.iter().find(|a| a.id == id).cloned())
    }

    async fn applicants_for_report(&self, report_id: Uuid) -> StoreResult<Vec<Applicant>> {
        let inner = self.lock();
        Ok(inner
            .applicants
            .iter()
            .filter(|a| a.report_id == report_id)
            .cloned()
            .collect())
    }

    async fn save_applicant(&self, applicant: &Applicant) -> StoreResult<()> {
        let mut inner = self.lock();
        let slot = inner
            .applicants
            .iter_mut()
            .find(|a| a.id == applicant.id)
            .ok_or_else(|| StoreError::NotFound(format!("Applicant {}", applicant.id)))?;
        *slot = applicant.clone();
        Ok(())
    }

    async fn delete_applicants_for_report(&self, report_id: Uuid) -> StoreResult<u64> {
        let mut inner = self.lock();
        let before = inner.applicants.len();
        inner.applicants.retain(|a| a.report_id != report_id);
        Ok((before - inner.applicants.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_claim_flips_pending_to_processing() {
        let store = MemoryStore::new();
        let resume = Resume::new_pending(Uuid::new_v4(), "a.pdf", "/tmp/a.pdf", 3);
        store.insert_resume(&resume).await.unwrap();

        let claimed = store.claim_next_pending_resume().await.unwrap().unwrap();
        assert_eq!(claimed.id, resume.id);
        assert_eq!(claimed.status, ResumeStatus::Processing);
        assert!(store.claim_next_pending_resume().await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_are_exclusive() {
        let store = Arc::new(MemoryStore::new());
        let folder_id = Uuid::new_v4();
        for i in 0..40 {
            let resume =
                Resume::new_pending(folder_id, format!("{i}.pdf"), format!("/tmp/{i}.pdf"), 3);
            store.insert_resume(&resume).await.unwrap();
        }

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                let mut mine = Vec::new();
                while let Some(resume) = store.claim_next_pending_resume().await.unwrap() {
                    mine.push(resume.id);
                    tokio::task::yield_now().await;
                }
                mine
            }));
        }

        let mut seen = HashSet::new();
        let mut total = 0;
        for task in tasks {
            for id in task.await.unwrap() {
                total += 1;
                assert!(seen.insert(id), "resume {id} claimed twice");
            }
        }
        assert_eq!(total, 40);
    }

    #[tokio::test]
    async fn test_processed_append_is_idempotent() {
        let store = MemoryStore::new();
        let folder = Folder::new(Uuid::new_v4(), "Backend hires");
        store.insert_folder(&folder).await.unwrap();
        let resume_id = Uuid::new_v4();

        store.add_processed_file(folder.id, resume_id).await.unwrap();
        store.add_processed_file(folder.id, resume_id).await.unwrap();

        let folder = store.get_folder(folder.id).await.unwrap().unwrap();
        assert_eq!(folder.processed_files, vec![resume_id]);
    }
}

use tracing::{info, instrument};

use edugest_academics::{ClassGroup, Subject};
use edugest_core::{AssignmentId, Page, PageRequest, TeacherId};
use edugest_staff::{NewTeacher, NewTeachingAssignment, Teacher, TeacherPatch, TeachingAssignment};

use super::{SchoolService, ServiceResult};
use crate::store::{CascadeSummary, Filter, ListQuery};

impl SchoolService {
    pub async fn create_teacher(&self, input: NewTeacher) -> ServiceResult<Teacher> {
        let teacher = Teacher::create(input, self.now())?;
        self.insert(&teacher).await?;
        Ok(teacher)
    }

    pub async fn update_teacher(
        &self,
        id: TeacherId,
        patch: TeacherPatch,
    ) -> ServiceResult<Teacher> {
        let mut teacher = self.get::<Teacher>(id).await?;
        teacher.apply(patch, self.now())?;
        self.save(&teacher).await?;
        Ok(teacher)
    }

    /// Removes the teacher together with every assignment.
    #[instrument(skip(self), err)]
    pub async fn delete_teacher(&self, id: TeacherId) -> ServiceResult<CascadeSummary> {
        let summary = self.store.delete_teacher_cascade(id).await?;
        info!(removed = summary.total(), "{}", summary.message());
        Ok(summary)
    }

    pub async fn teacher_assignments(
        &self,
        id: TeacherId,
        page: PageRequest,
    ) -> ServiceResult<Page<TeachingAssignment>> {
        self.exists::<Teacher>(id).await?;
        self.list::<TeachingAssignment>(ListQuery::paged(page).filter(Filter::Teacher(id)))
            .await
    }

    /// The teacher must be active and the subject must be in the grid of the
    /// group's course + class level.
    #[instrument(
        skip(self, input),
        fields(teacher_id = %input.teacher_id, class_group_id = %input.class_group_id),
        err
    )]
    pub async fn assign_teacher(
        &self,
        input: NewTeachingAssignment,
    ) -> ServiceResult<TeachingAssignment> {
        let teacher = self.get::<Teacher>(input.teacher_id).await?;
        let group = self.get::<ClassGroup>(input.class_group_id).await?;
        self.exists::<Subject>(input.subject_id).await?;
        let grid = self
            .curriculum_grid(group.course_id, group.class_level_id)
            .await?;

        let assignment =
            TeachingAssignment::create(&teacher, &group, input.subject_id, &grid, self.now())?;
        self.insert(&assignment).await?;
        Ok(assignment)
    }

    pub async fn delete_assignment(&self, id: AssignmentId) -> ServiceResult<()> {
        self.remove::<TeachingAssignment>(id).await
    }
}
